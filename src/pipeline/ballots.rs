// Extraction of the ballot titles for the manual short-title workflow.

use log::info;
use serde::{Deserialize, Serialize};

use crate::pipeline::results::VoteInfo;

/// One row of the ballot-name table. `title_short` is left empty on
/// purpose: the analyst fills it in by hand before the downstream
/// reporting step.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotTitleRow {
    #[serde(rename = "ballot-id")]
    pub ballot_id: u32,
    #[serde(rename = "langue")]
    pub lang: String,
    pub title_long: String,
    pub title_short: String,
}

/// Extracts one row per ballot and language (FR and DE), sorted by ballot
/// id then language.
pub fn extract_titles(voteinfo: &VoteInfo) -> Vec<BallotTitleRow> {
    let mut rows: Vec<BallotTitleRow> = Vec::new();
    for ballot in voteinfo.national.ballots.iter() {
        for title in ballot.titles.iter() {
            if title.lang == "fr" || title.lang == "de" {
                rows.push(BallotTitleRow {
                    ballot_id: ballot.id,
                    lang: title.lang.to_uppercase(),
                    title_long: title.text.clone(),
                    title_short: String::new(),
                });
            }
        }
    }
    rows.sort_by(|a, b| (a.ballot_id, a.lang.as_str()).cmp(&(b.ballot_id, b.lang.as_str())));
    info!(
        "extract_titles: {:?} entries ({:?} ballots x 2 languages)",
        rows.len(),
        rows.len() / 2
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::results::{Ballot, BallotTitle, NationalResults};

    fn ballot(id: u32, fr: &str, de: &str) -> Ballot {
        Ballot {
            id,
            titles: vec![
                BallotTitle {
                    lang: "de".to_string(),
                    text: de.to_string(),
                },
                BallotTitle {
                    lang: "it".to_string(),
                    text: "(testo italiano)".to_string(),
                },
                BallotTitle {
                    lang: "fr".to_string(),
                    text: fr.to_string(),
                },
            ],
            cantons: vec![],
        }
    }

    #[test]
    fn extracts_french_and_german_titles() {
        let voteinfo = VoteInfo {
            national: NationalResults {
                ballots: vec![
                    ballot(6651, "Imposition individuelle", "Individualbesteuerung"),
                    ballot(6650, "Routes nationales", "Nationalstrassen"),
                ],
            },
        };
        let rows = extract_titles(&voteinfo);
        assert_eq!(rows.len(), 4);
        // Sorted by ballot id then language, the Italian title is dropped.
        let keys: Vec<(u32, &str)> = rows
            .iter()
            .map(|r| (r.ballot_id, r.lang.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(6650, "DE"), (6650, "FR"), (6651, "DE"), (6651, "FR")]
        );
        assert_eq!(rows[1].title_long, "Routes nationales");
        assert!(rows.iter().all(|r| r.title_short.is_empty()));
    }
}
