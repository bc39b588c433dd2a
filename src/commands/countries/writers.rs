use rusqlite::types::Value;

use crate::batch::{BatchResult, DenormalizingWriter, SqlBatchWriter};

use super::domain::{CountryCapital, CountryData};
use super::mapper::country_capitals;

const INSERT_COUNTRY: &str = "
    INSERT INTO country(
      code, common_name, official_name, flag_emoji, flag_img, region, population, google_map_url
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
";

const INSERT_CAPITAL: &str = "INSERT INTO country_capital(capital, country_code) VALUES (?1, ?2)";

fn text(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn bind_country(country: &CountryData) -> BatchResult<Vec<Value>> {
    Ok(vec![
        text(&country.code),
        text(&country.common_name),
        text(&country.official_name),
        text(&country.flag_emoji),
        text(&country.flag_img),
        text(&country.region),
        Value::Integer(country.population),
        text(&country.google_map_url),
    ])
}

fn bind_capital(capital: &CountryCapital) -> BatchResult<Vec<Value>> {
    Ok(vec![
        Value::Text(capital.capital.clone()),
        Value::Text(capital.country_code.clone()),
    ])
}

pub fn capital_writer() -> SqlBatchWriter<CountryCapital> {
    SqlBatchWriter::new("country_capital", INSERT_CAPITAL, bind_capital).assert_updates(false)
}

pub fn country_writer() -> DenormalizingWriter<CountryData, CountryCapital> {
    DenormalizingWriter::new(
        SqlBatchWriter::new("country", INSERT_COUNTRY, bind_country),
        capital_writer(),
        country_capitals,
    )
}
