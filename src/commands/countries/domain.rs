use serde::Deserialize;

pub const UNKNOWN_COUNTRY_CODE: &str = "UNKNOWN";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    pub code: Option<String>,
    pub common_name: Option<String>,
    pub official_name: Option<String>,
    pub flag_emoji: Option<String>,
    pub flag_img: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    #[serde(rename = "googleMapURL")]
    pub google_map_url: Option<String>,
    pub capital: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryData {
    pub code: Option<String>,
    pub common_name: Option<String>,
    pub official_name: Option<String>,
    pub flag_emoji: Option<String>,
    pub flag_img: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub google_map_url: Option<String>,
    pub capitals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCapital {
    pub capital: String,
    pub country_code: String,
}
