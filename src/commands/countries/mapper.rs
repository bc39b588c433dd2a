use tracing::warn;

use crate::batch::{BatchError, BatchResult};

use super::domain::{CountryCapital, CountryData, CountryRecord, UNKNOWN_COUNTRY_CODE};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn normalize_country(record: CountryRecord) -> BatchResult<CountryData> {
    let population = record.population.unwrap_or(0);
    if population < 0 {
        return Err(BatchError::malformed(
            "population",
            &population.to_string(),
            "population must not be negative",
        ));
    }

    let capitals = record
        .capital
        .unwrap_or_default()
        .into_iter()
        .map(|capital| capital.trim().to_string())
        .filter(|capital| !capital.is_empty())
        .collect();

    Ok(CountryData {
        code: non_blank(record.code),
        common_name: non_blank(record.common_name),
        official_name: non_blank(record.official_name),
        flag_emoji: non_blank(record.flag_emoji),
        flag_img: non_blank(record.flag_img),
        region: non_blank(record.region),
        population,
        google_map_url: non_blank(record.google_map_url),
        capitals,
    })
}

pub fn country_capitals(country: &CountryData) -> Vec<CountryCapital> {
    let country_code = match &country.code {
        Some(code) => code.clone(),
        None => {
            if !country.capitals.is_empty() {
                warn!(
                    country = %country.common_name.as_deref().unwrap_or_default(),
                    capitals = country.capitals.len(),
                    sentinel = UNKNOWN_COUNTRY_CODE,
                    "country has no code, keying capitals by sentinel"
                );
            }
            UNKNOWN_COUNTRY_CODE.to_string()
        }
    };

    country
        .capitals
        .iter()
        .map(|capital| CountryCapital {
            capital: capital.clone(),
            country_code: country_code.clone(),
        })
        .collect()
}
