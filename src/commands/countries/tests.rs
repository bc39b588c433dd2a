use std::fs;
use std::io::Cursor;

use rusqlite::Connection;

use super::domain::{CountryCapital, CountryData, CountryRecord, UNKNOWN_COUNTRY_CODE};
use super::mapper::{country_capitals, normalize_country};
use super::run::run;
use super::writers::{capital_writer, country_writer};
use crate::batch::{
    BatchError, ChunkStep, ItemWriter, JsonArrayItemReader, LoggingChunkListener, StepStatus,
};
use crate::cli::{CountriesArgs, JobArgs};
use crate::commands::schema::{ensure_schema, open_database};

const COUNTRIES: &str = r#"[
  {
    "code": "US",
    "commonName": "United States",
    "officialName": "United States of America",
    "flagEmoji": "🇺🇸",
    "flagImg": "https://flagcdn.com/us.svg",
    "region": "Americas",
    "population": 329484123,
    "googleMapURL": "https://goo.gl/maps/e8M246zY4BSjkjAv6",
    "capital": ["Washington", "New York"]
  },
  {
    "code": "AQ",
    "commonName": "Antarctica",
    "region": "Antarctic",
    "population": 1000,
    "capital": []
  },
  {
    "code": "  ",
    "commonName": "Nowhere",
    "capital": [" Atlantis ", ""]
  }
]"#;

fn connection() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory DB should open");
    ensure_schema(&connection).unwrap();
    connection
}

fn records() -> Vec<CountryRecord> {
    serde_json::from_str(COUNTRIES).unwrap()
}

fn capitals(connection: &Connection) -> Vec<(String, String)> {
    connection
        .prepare("SELECT capital, country_code FROM country_capital ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn country(code: Option<&str>, capitals: &[&str]) -> CountryData {
    CountryData {
        code: code.map(str::to_string),
        common_name: Some("Testland".to_string()),
        official_name: None,
        flag_emoji: None,
        flag_img: None,
        region: None,
        population: 0,
        google_map_url: None,
        capitals: capitals.iter().map(|capital| capital.to_string()).collect(),
    }
}

#[test]
fn normalization_drops_blank_values_and_capitals() {
    let mut records = records().into_iter();

    let us = normalize_country(records.next().unwrap()).unwrap();
    assert_eq!(us.code.as_deref(), Some("US"));
    assert_eq!(
        us.google_map_url.as_deref(),
        Some("https://goo.gl/maps/e8M246zY4BSjkjAv6")
    );
    assert_eq!(us.capitals, vec!["Washington", "New York"]);

    let antarctica = normalize_country(records.next().unwrap()).unwrap();
    assert_eq!(antarctica.official_name, None);
    assert!(antarctica.capitals.is_empty());

    let nowhere = normalize_country(records.next().unwrap()).unwrap();
    assert_eq!(nowhere.code, None);
    assert_eq!(nowhere.population, 0);
    assert_eq!(nowhere.capitals, vec!["Atlantis"]);
}

#[test]
fn negative_population_is_malformed() {
    let record: CountryRecord =
        serde_json::from_str(r#"{ "code": "XX", "population": -5 }"#).unwrap();
    assert!(matches!(
        normalize_country(record),
        Err(BatchError::MalformedField { ref field, .. }) if field == "population"
    ));
}

#[test]
fn capitals_carry_the_country_code_or_sentinel() {
    assert_eq!(
        country_capitals(&country(Some("US"), &["Washington", "New York"])),
        vec![
            CountryCapital {
                capital: "Washington".to_string(),
                country_code: "US".to_string(),
            },
            CountryCapital {
                capital: "New York".to_string(),
                country_code: "US".to_string(),
            },
        ]
    );

    let orphans = country_capitals(&country(None, &["Atlantis"]));
    assert_eq!(orphans[0].country_code, UNKNOWN_COUNTRY_CODE);
    assert!(country_capitals(&country(Some("AQ"), &[])).is_empty());
}

#[test]
fn country_with_two_capitals_writes_two_child_rows() {
    let connection = connection();
    let writer = country_writer();

    let rows = writer
        .write(&connection, &[country(Some("US"), &["Washington", "New York"])])
        .unwrap();
    assert_eq!(rows, 3);
    assert_eq!(
        capitals(&connection),
        vec![
            ("Washington".to_string(), "US".to_string()),
            ("New York".to_string(), "US".to_string()),
        ]
    );
}

#[test]
fn country_without_capitals_writes_no_child_rows() {
    let connection = connection();
    let writer = country_writer();

    let rows = writer
        .write(&connection, &[country(Some("AQ"), &[])])
        .unwrap();
    assert_eq!(rows, 1);
    assert!(capitals(&connection).is_empty());
}

#[test]
fn capital_writer_is_usable_alone() {
    let connection = connection();
    let rows = capital_writer()
        .write(
            &connection,
            &[CountryCapital {
                capital: "Bern".to_string(),
                country_code: "CH".to_string(),
            }],
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn json_input_is_imported_in_chunks() {
    let mut connection = connection();
    let writer = country_writer();
    let step = ChunkStep::<CountryRecord, CountryData>::new("countries", 2, &normalize_country, &writer)
        .unwrap();
    let mut reader =
        JsonArrayItemReader::<_, CountryRecord>::from_reader(Cursor::new(COUNTRIES)).unwrap();

    let execution = step
        .execute(&mut connection, &mut reader, &mut LoggingChunkListener)
        .unwrap();

    assert_eq!(execution.status, StepStatus::Completed);
    assert_eq!(execution.chunk_count, 2);
    assert_eq!(execution.write_count, 3);
    assert_eq!(execution.rows_affected, 6);

    let countries: i64 = connection
        .query_row("SELECT COUNT(*) FROM country", [], |row| row.get(0))
        .unwrap();
    assert_eq!(countries, 3);
    assert_eq!(
        capitals(&connection),
        vec![
            ("Washington".to_string(), "US".to_string()),
            ("New York".to_string(), "US".to_string()),
            ("Atlantis".to_string(), UNKNOWN_COUNTRY_CODE.to_string()),
        ]
    );
}

#[test]
fn duplicate_country_rolls_back_its_chunk() {
    let mut connection = connection();
    let writer = country_writer();
    let step = ChunkStep::<CountryRecord, CountryData>::new("countries", 10, &normalize_country, &writer)
        .unwrap();
    let input = r#"[
      { "code": "FR", "capital": ["Paris"] },
      { "code": "FR", "capital": ["Paris"] }
    ]"#;
    let mut reader =
        JsonArrayItemReader::<_, CountryRecord>::from_reader(Cursor::new(input)).unwrap();

    let failed = step
        .execute(&mut connection, &mut reader, &mut LoggingChunkListener)
        .unwrap_err();

    assert!(matches!(
        failed.error,
        BatchError::WriteFailure { writer: "country", index: 1, .. }
    ));
    assert!(capitals(&connection).is_empty());
}

#[test]
fn command_imports_file_and_writes_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("countries.json");
    fs::write(&input, COUNTRIES).unwrap();
    let db_path = dir.path().join("countries.sqlite");

    run(CountriesArgs {
        job: JobArgs {
            cache_root: dir.path().to_path_buf(),
            db_path: Some(db_path.clone()),
            input,
            manifest_dir: None,
        },
        chunk_size: 10,
    })
    .unwrap();

    let connection = open_database(&db_path).unwrap();
    assert_eq!(capitals(&connection).len(), 3);

    let manifests: Vec<_> = fs::read_dir(dir.path().join("manifests"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(manifests.len(), 1);
    let name = manifests[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("countries_run_"));
}

#[test]
fn malformed_element_fails_its_chunk_after_earlier_chunks_commit() {
    let mut connection = connection();
    let writer = country_writer();
    let step = ChunkStep::<CountryRecord, CountryData>::new("countries", 2, &normalize_country, &writer)
        .unwrap();
    let input = r#"[{ "code": "A" }, { "code": "B" }, { "code": 3 }]"#;
    let mut reader =
        JsonArrayItemReader::<_, CountryRecord>::from_reader(Cursor::new(input)).unwrap();

    let failed = step
        .execute(&mut connection, &mut reader, &mut LoggingChunkListener)
        .unwrap_err();

    assert!(matches!(
        failed.error,
        BatchError::InvalidJsonElement { index: 2, .. }
    ));
    assert_eq!(failed.execution.status, StepStatus::Failed);
    assert_eq!(failed.execution.commit_count, 1);
    assert_eq!(failed.execution.read_count, 2);

    let countries: i64 = connection
        .query_row("SELECT COUNT(*) FROM country", [], |row| row.get(0))
        .unwrap();
    assert_eq!(countries, 2);
}

#[test]
fn command_records_failed_step_for_malformed_element() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("countries.json");
    fs::write(&input, r#"[{ "code": "A" }, { "code": "B" }, { "code": 3 }]"#).unwrap();
    let db_path = dir.path().join("countries.sqlite");

    let result = run(CountriesArgs {
        job: JobArgs {
            cache_root: dir.path().to_path_buf(),
            db_path: Some(db_path.clone()),
            input,
            manifest_dir: None,
        },
        chunk_size: 2,
    });
    assert!(result.is_err());

    let connection = open_database(&db_path).unwrap();
    let countries: i64 = connection
        .query_row("SELECT COUNT(*) FROM country", [], |row| row.get(0))
        .unwrap();
    assert_eq!(countries, 2);

    let (status, commits, failure): (String, i64, Option<String>) = connection
        .query_row(
            "SELECT status, commit_count, failure FROM batch_step_execution",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "failed");
    assert_eq!(commits, 1);
    assert!(failure.unwrap().contains("element 2"));
}

#[test]
fn command_rejects_non_array_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("countries.json");
    fs::write(&input, r#"{ "code": "US" }"#).unwrap();

    let result = run(CountriesArgs {
        job: JobArgs {
            cache_root: dir.path().to_path_buf(),
            db_path: None,
            input,
            manifest_dir: None,
        },
        chunk_size: 10,
    });
    assert!(result.is_err());
}
