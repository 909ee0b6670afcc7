use log::{info, warn};

use swiss_communes::*;

use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod ballots;
pub mod config_reader;
pub mod fetch;
pub mod io_common;
pub mod io_csv;
pub mod results;

use crate::args::Args;
use crate::pipeline::config_reader::*;
use crate::pipeline::io_common::strip_canton_abbreviation;

#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error fetching {url}"))]
    Fetching { source: reqwest::Error, url: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Column {column} is missing in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Could not parse number {text:?}"))]
    ParsingNumber { text: String },
    #[snafu(display("Could not parse date {text:?}"))]
    ParsingDate { text: String },
    #[snafu(display("Could not harmonize the communes: {source}"))]
    Harmonizing { source: ResolutionErrors },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    FlushingCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PipeResult<T> = Result<T, PipelineError>;

/// One row of the harmonized commune table, as written to disk.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HarmonizedRow {
    #[serde(rename = "order_ic")]
    pub order: u32,
    #[serde(rename = "ligne")]
    pub line: String,
    #[serde(rename = "GMDNR")]
    pub geocode: u32,
    #[serde(rename = "Name_fr")]
    pub name: String,
    #[serde(rename = "iso2")]
    pub canton: String,
    #[serde(rename = "fr")]
    pub name_fr: String,
    #[serde(rename = "de")]
    pub name_de: String,
}

/// A display-name translation, keyed by the official French name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Translation {
    pub fr: String,
    pub de: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSummary {
    pub commune_count: usize,
    pub duplicate_count: usize,
    pub ballot_count: usize,
    pub result_count: usize,
    pub harmonized_path: String,
    pub ballots_path: String,
    pub results_path: String,
}

fn output_path(out_dir: &str, prefix: &str, voting_date: &str) -> String {
    let p: PathBuf = [out_dir, format!("{}_{}.csv", prefix, voting_date).as_str()]
        .iter()
        .collect();
    p.as_path().display().to_string()
}

/// Builds the display columns of the harmonized table: canton abbreviation
/// and FR/DE names, with the official name as fallback for missing
/// translations and trailing canton abbreviations stripped.
fn assemble_rows(
    harmonization: &HarmonizationResult,
    cantons: &HashMap<u32, String>,
    translations: &HashMap<String, Translation>,
) -> Vec<HarmonizedRow> {
    let mut res: Vec<HarmonizedRow> = Vec::new();
    for stop in harmonization.stops.iter() {
        let canton = match cantons.get(&stop.region_code) {
            Some(c) => c.clone(),
            None => {
                warn!(
                    "assemble_rows: no canton abbreviation for region {:?} ({})",
                    stop.region_code, stop.name
                );
                String::new()
            }
        };
        let (fr, de) = match translations.get(&stop.name) {
            Some(t) => (
                if t.fr.is_empty() { stop.name.clone() } else { t.fr.clone() },
                if t.de.is_empty() { stop.name.clone() } else { t.de.clone() },
            ),
            None => (stop.name.clone(), stop.name.clone()),
        };
        res.push(HarmonizedRow {
            order: stop.order,
            line: stop.line.clone(),
            geocode: stop.geocode,
            name: stop.name.clone(),
            canton,
            name_fr: strip_canton_abbreviation(&fr),
            name_de: strip_canton_abbreviation(&de),
        });
    }
    res
}

pub fn run_pipeline(args: &Args) -> PipeResult<RunSummary> {
    let mut config = read_config(&args.config)?;
    if let Some(d) = &args.voting_date {
        config.voting_date = d.clone();
    }
    if let Some(o) = &args.out_dir {
        config.output_directory = Some(o.clone());
    }
    info!("config: {:?}", config);

    let voting_date = config.voting_date()?;
    let reference_date = config.reference_date()?;
    let out_dir = config
        .output_directory
        .clone()
        .unwrap_or_else(|| "output".to_string());
    fs::create_dir_all(&out_dir).context(CreatingOutputDirSnafu {
        path: out_dir.clone(),
    })?;

    if config.line_sources.is_empty() {
        whatever!("no line sources in the configuration");
    }

    // The line-municipality lists, possibly with historical geocodes.
    let mut stops: Vec<LineStop> = Vec::new();
    for ls in config.line_sources.iter() {
        let mut file_stops = io_csv::read_line_stops(ls)?;
        info!("line {}: {} communes", ls.name, file_stops.len());
        stops.append(&mut file_stops);
    }

    // The mutation registry and the commune reference for the target date.
    let mutations_url = match &config.mutations_url {
        Some(url) => url.clone(),
        None => fetch::mutations_url(config.mutations_start()?, reference_date),
    };
    let mutations = io_csv::parse_mutations(fetch::get_text(&mutations_url)?.as_bytes())?;
    info!("{} mutations over the configured period", mutations.len());

    let geolevels_url = match &config.geolevels_url {
        Some(url) => url.clone(),
        None => fetch::geolevels_url(reference_date),
    };
    let communes = io_csv::parse_communes(fetch::get_text(&geolevels_url)?.as_bytes())?;
    info!("{} communes in the reference", communes.len());

    let harmonization = run_harmonization(&stops, &mutations, &communes, voting_date)
        .context(HarmonizingSnafu {})?;
    for dup in harmonization.duplicates.iter() {
        warn!(
            "line {}: communes {:?} merged into {}",
            dup.line, dup.merged_from, dup.geocode
        );
    }

    let cantons = io_csv::read_cantons(&config.canton_file)?;
    let translations = io_csv::read_translations(&config.translation_file)?;
    let rows = assemble_rows(&harmonization, &cantons, &translations);

    let harmonized_path = output_path(&out_dir, "harmonized", &config.voting_date);
    io_csv::write_harmonized(&harmonized_path, &rows)?;
    info!("harmonized table written to {}", harmonized_path);

    // The voting results and the ballot titles come from the same file.
    let voteinfo = results::parse_voteinfo(&fetch::get_text(&config.results_url)?)?;

    let titles = ballots::extract_titles(&voteinfo);
    let ballots_path = output_path(&out_dir, "ballot_name", &config.voting_date);
    io_csv::write_ballot_titles(&ballots_path, &titles)?;
    info!("ballot names written to {}", ballots_path);

    // The results stage works from the harmonized file on disk, exactly as a
    // later standalone run would.
    let rows = io_csv::read_harmonized(&harmonized_path)?;
    let result_rows = results::extract_results(&voteinfo)?;
    let (final_rows, missing) = results::join_results(&rows, &result_rows);
    for row in missing.iter() {
        warn!(
            "no voting results for {} - ID: {} - ligne: {}",
            row.name, row.geocode, row.line
        );
    }

    let results_path = output_path(&out_dir, "profil_results", &config.voting_date);
    io_csv::write_final_results(&results_path, &final_rows)?;
    info!("final results written to {}", results_path);

    Ok(RunSummary {
        commune_count: rows.len(),
        duplicate_count: harmonization.duplicates.len(),
        ballot_count: titles.len() / 2,
        result_count: final_rows.len(),
        harmonized_path,
        ballots_path,
        results_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harmonization() -> HarmonizationResult {
        HarmonizationResult {
            stops: vec![
                HarmonizedStop {
                    line: "ic_1".to_string(),
                    order: 1,
                    historical_geocode: 5586,
                    geocode: 5586,
                    name: "Lausanne".to_string(),
                    region_code: 22,
                },
                HarmonizedStop {
                    line: "ic_1".to_string(),
                    order: 2,
                    historical_geocode: 5624,
                    geocode: 5624,
                    name: "Morges (VD)".to_string(),
                    region_code: 22,
                },
                HarmonizedStop {
                    line: "ic_1".to_string(),
                    order: 3,
                    historical_geocode: 2701,
                    geocode: 2701,
                    name: "Bâle".to_string(),
                    region_code: 12,
                },
            ],
            duplicates: vec![],
        }
    }

    #[test]
    fn assemble_rows_joins_cantons_and_translations() {
        let cantons: HashMap<u32, String> =
            vec![(22, "VD".to_string()), (12, "BS".to_string())]
                .into_iter()
                .collect();
        let translations: HashMap<String, Translation> = vec![(
            "Bâle".to_string(),
            Translation {
                fr: "Bâle".to_string(),
                de: "Basel".to_string(),
            },
        )]
        .into_iter()
        .collect();

        let rows = assemble_rows(&harmonization(), &cantons, &translations);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].canton, "VD");
        // No translation: the official name is used for both languages.
        assert_eq!(rows[0].name_fr, "Lausanne");
        assert_eq!(rows[0].name_de, "Lausanne");
        // The canton abbreviation is stripped from the display names only.
        assert_eq!(rows[1].name, "Morges (VD)");
        assert_eq!(rows[1].name_fr, "Morges");
        assert_eq!(rows[2].name_fr, "Bâle");
        assert_eq!(rows[2].name_de, "Basel");
    }

    #[test]
    fn assemble_rows_leaves_unknown_regions_blank() {
        let rows = assemble_rows(&harmonization(), &HashMap::new(), &HashMap::new());
        assert!(rows.iter().all(|r| r.canton.is_empty()));
    }

    #[test]
    fn output_paths_carry_the_voting_date() {
        let p = output_path("output", "profil_results", "2024-11-24");
        assert!(p.ends_with("profil_results_2024-11-24.csv"));
    }
}
