use crate::pipeline::*;

use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;

/// One line-municipality list to harmonize.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LineSource {
    pub name: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "orderColumn")]
    pub order_column: String,
    #[serde(rename = "geocodeColumn")]
    _geocode_column: Option<String>,
}

impl LineSource {
    pub fn geocode_column(&self) -> String {
        self._geocode_column
            .clone()
            .unwrap_or_else(|| "GMDNR".to_string())
    }
}

/// The run configuration for one voting date.
///
/// The URLs of the two federal reference endpoints are derived from the
/// dates; `mutationsUrl` and `geolevelsUrl` override them for offline runs.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "votingDate")]
    pub voting_date: String,
    #[serde(rename = "resultsUrl")]
    pub results_url: String,
    #[serde(rename = "lineSources")]
    pub line_sources: Vec<LineSource>,
    #[serde(rename = "cantonFile")]
    pub canton_file: String,
    #[serde(rename = "translationFile")]
    pub translation_file: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "mutationsUrl")]
    pub mutations_url: Option<String>,
    #[serde(rename = "geolevelsUrl")]
    pub geolevels_url: Option<String>,
    #[serde(rename = "mutationsStartDate")]
    _mutations_start_date: Option<String>,
    #[serde(rename = "referenceDate")]
    _reference_date: Option<String>,
}

impl PipelineConfig {
    pub fn voting_date(&self) -> PipeResult<NaiveDate> {
        parse_iso_date(&self.voting_date)
    }

    /// The date the commune reference is taken at. Defaults to the voting
    /// date so that reruns months later produce the same tables.
    pub fn reference_date(&self) -> PipeResult<NaiveDate> {
        match &self._reference_date {
            Some(s) => parse_iso_date(s),
            None => self.voting_date(),
        }
    }

    /// The start of the mutation period. Defaults to January 1 of the
    /// voting year: earlier mutations are already reflected in the line
    /// lists, which are refreshed yearly.
    pub fn mutations_start(&self) -> PipeResult<NaiveDate> {
        match &self._mutations_start_date {
            Some(s) => parse_iso_date(s),
            None => {
                let vd = self.voting_date()?;
                Ok(NaiveDate::from_ymd_opt(vd.year(), 1, 1).unwrap())
            }
        }
    }
}

fn parse_iso_date(text: &str) -> PipeResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .context(ParsingDateSnafu { text })
}

pub fn read_config(path: &str) -> PipeResult<PipelineConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: PipelineConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
    {
        "votingDate": "2024-11-24",
        "resultsUrl": "https://ogd-static.voteinfo-app.ch/v1/ogd/sd-t-17-02-20241124-eidgAbstimmung.json",
        "lineSources": [
            { "name": "ic_1", "filePath": "input/processed/InterCity_1_communes.csv", "orderColumn": "order_ic1" },
            { "name": "ic_21", "filePath": "input/processed/InterCity_21_communes.csv", "orderColumn": "order_ic21" }
        ],
        "cantonFile": "input/processed/canton_iso2.csv",
        "translationFile": "input/processed/translations.csv"
    }
    "#;

    #[test]
    fn parses_a_minimal_configuration() {
        let config: PipelineConfig = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(config.voting_date, "2024-11-24");
        assert_eq!(config.line_sources.len(), 2);
        assert_eq!(config.line_sources[0].name, "ic_1");
        assert_eq!(config.line_sources[0].order_column, "order_ic1");
        // Defaults for the optional fields.
        assert_eq!(config.line_sources[0].geocode_column(), "GMDNR");
        assert_eq!(config.output_directory, None);
        let vd = config.voting_date().unwrap();
        assert_eq!(config.reference_date().unwrap(), vd);
        assert_eq!(
            config.mutations_start().unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn rejects_a_bad_voting_date() {
        let mut config: PipelineConfig = serde_json::from_str(CONFIG).unwrap();
        config.voting_date = "24.11.2024".to_string();
        assert!(config.voting_date().is_err());
    }
}
