// Reader for the real-time voting-result JSON published on voting day.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::pipeline::*;

pub fn parse_voteinfo(text: &str) -> PipeResult<VoteInfo> {
    serde_json::from_str(text).context(ParsingJsonSnafu {})
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteInfo {
    #[serde(rename = "schweiz")]
    pub national: NationalResults,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NationalResults {
    #[serde(rename = "vorlagen")]
    pub ballots: Vec<Ballot>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "vorlagenId")]
    pub id: u32,
    #[serde(rename = "vorlagenTitel")]
    pub titles: Vec<BallotTitle>,
    #[serde(rename = "kantone")]
    pub cantons: Vec<CantonResults>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotTitle {
    #[serde(rename = "langKey")]
    pub lang: String,
    #[serde(rename = "text")]
    pub text: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CantonResults {
    #[serde(rename = "gemeinden")]
    pub communes: Vec<CommuneResults>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CommuneResults {
    // The commune geocode is published as a decimal string.
    #[serde(rename = "geoLevelnummer")]
    pub geocode: String,
    #[serde(rename = "resultat")]
    pub tally: CommuneTally,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CommuneTally {
    // The fields are absent while a commune is still counting.
    #[serde(rename = "jaStimmenAbsolut")]
    pub yes_count: Option<u64>,
    #[serde(rename = "neinStimmenAbsolut")]
    pub no_count: Option<u64>,
    #[serde(rename = "jaStimmenInProzent")]
    pub yes_pct: Option<f64>,
    #[serde(rename = "stimmbeteiligungInProzent")]
    pub turnout: Option<f64>,
}

/// One flattened result row: a commune's tally for one ballot.
#[derive(PartialEq, Debug, Clone)]
pub struct ResultRow {
    pub geocode: u32,
    pub ballot_id: u32,
    pub yes_count: u64,
    pub no_count: u64,
    pub yes_pct: f64,
    pub turnout: Option<f64>,
}

fn yes_share(yes_count: u64, no_count: u64) -> f64 {
    let total = yes_count + no_count;
    if total == 0 {
        0.0
    } else {
        100.0 * yes_count as f64 / total as f64
    }
}

/// Flattens the nested per-canton structure into one row per commune and
/// ballot. Communes whose tallies are not yet populated are skipped.
pub fn extract_results(voteinfo: &VoteInfo) -> PipeResult<Vec<ResultRow>> {
    let mut res: Vec<ResultRow> = Vec::new();
    for ballot in voteinfo.national.ballots.iter() {
        for canton in ballot.cantons.iter() {
            for commune in canton.communes.iter() {
                let geocode: u32 = match commune.geocode.trim().parse() {
                    Ok(g) => g,
                    Err(_) => whatever!("could not parse geocode {:?}", commune.geocode),
                };
                let t = &commune.tally;
                let (yes_count, no_count) = match (t.yes_count, t.no_count) {
                    (Some(y), Some(n)) => (y, n),
                    _ => {
                        debug!(
                            "extract_results: no tally yet for commune {:?}, ballot {:?}",
                            geocode, ballot.id
                        );
                        continue;
                    }
                };
                res.push(ResultRow {
                    geocode,
                    ballot_id: ballot.id,
                    yes_count,
                    no_count,
                    yes_pct: t.yes_pct.unwrap_or_else(|| yes_share(yes_count, no_count)),
                    turnout: t.turnout,
                });
            }
        }
    }
    info!(
        "extract_results: {:?} rows for {:?} ballots",
        res.len(),
        voteinfo.national.ballots.len()
    );
    Ok(res)
}

/// One row of the final results table.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FinalRow {
    #[serde(rename = "GMDNR")]
    pub geocode: u32,
    pub order: u32,
    #[serde(rename = "ligne")]
    pub line: String,
    #[serde(rename = "GMDNAME")]
    pub name: String,
    #[serde(rename = "GMDNAME_FR")]
    pub name_fr: String,
    #[serde(rename = "GMDNAME_DE")]
    pub name_de: String,
    #[serde(rename = "KTN_abr")]
    pub canton: String,
    pub ballot_id: u32,
    pub yes_count: u64,
    pub no_count: u64,
    pub yes_pct: f64,
    pub turnout: Option<f64>,
}

// Accumulator for rows sharing a (geocode, ballot) key: counts are summed,
// the turnout is averaged weighted by ballots cast.
#[derive(PartialEq, Debug, Clone, Default)]
struct Tally {
    yes: u64,
    no: u64,
    turnout_weighted: f64,
    turnout_base: u64,
}

impl Tally {
    fn add(&mut self, row: &ResultRow) {
        self.yes += row.yes_count;
        self.no += row.no_count;
        if let Some(t) = row.turnout {
            let cast = row.yes_count + row.no_count;
            self.turnout_weighted += t * cast as f64;
            self.turnout_base += cast;
        }
    }

    fn yes_pct(&self) -> f64 {
        yes_share(self.yes, self.no)
    }

    fn turnout(&self) -> Option<f64> {
        if self.turnout_base == 0 {
            None
        } else {
            Some(self.turnout_weighted / self.turnout_base as f64)
        }
    }
}

/// Restricts the result rows to the harmonized communes, aggregates rows
/// sharing a canonical geocode and joins the display columns.
///
/// Returns the final rows sorted by (ballot, line, order), and the
/// harmonized rows that have no results at all (to be reported, not
/// silently dropped).
pub fn join_results(
    harmonized: &[HarmonizedRow],
    results: &[ResultRow],
) -> (Vec<FinalRow>, Vec<HarmonizedRow>) {
    let line_geocodes: HashSet<u32> = harmonized.iter().map(|r| r.geocode).collect();

    let mut tallies: BTreeMap<(u32, u32), Tally> = BTreeMap::new();
    for row in results.iter() {
        if !line_geocodes.contains(&row.geocode) {
            continue;
        }
        tallies
            .entry((row.geocode, row.ballot_id))
            .or_default()
            .add(row);
    }

    let with_results: HashSet<u32> = tallies.keys().map(|&(g, _)| g).collect();
    let missing: Vec<HarmonizedRow> = harmonized
        .iter()
        .filter(|r| !with_results.contains(&r.geocode))
        .cloned()
        .collect();

    let mut rows: Vec<FinalRow> = Vec::new();
    for hr in harmonized.iter() {
        for (&(geocode, ballot_id), tally) in
            tallies.range((hr.geocode, u32::MIN)..=(hr.geocode, u32::MAX))
        {
            rows.push(FinalRow {
                geocode,
                order: hr.order,
                line: hr.line.clone(),
                name: hr.name.clone(),
                name_fr: hr.name_fr.clone(),
                name_de: hr.name_de.clone(),
                canton: hr.canton.clone(),
                ballot_id,
                yes_count: tally.yes,
                no_count: tally.no,
                yes_pct: tally.yes_pct(),
                turnout: tally.turnout(),
            });
        }
    }
    rows.sort_by(|a, b| {
        (a.ballot_id, a.line.as_str(), a.order).cmp(&(b.ballot_id, b.line.as_str(), b.order))
    });
    (rows, missing)
}
