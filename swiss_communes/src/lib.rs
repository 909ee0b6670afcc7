pub mod builder;
mod config;
pub mod quick_start;

use chrono::NaiveDate;
use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct Geocode(u32);

// One outgoing edge of the mutation forest.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct Edge {
    terminal: Geocode,
    effective: NaiveDate,
}

// The mutations grouped by their initial geocode. Invariant: every bucket is
// non-empty and sorted by effective date.
#[derive(Debug, Clone)]
struct MutationRegistry {
    by_initial: HashMap<Geocode, Vec<Edge>>,
}

impl MutationRegistry {
    fn build(mutations: &[Mutation]) -> MutationRegistry {
        let mut by_initial: HashMap<Geocode, Vec<Edge>> = HashMap::new();
        for m in mutations.iter() {
            by_initial
                .entry(Geocode(m.initial_geocode))
                .or_default()
                .push(Edge {
                    terminal: Geocode(m.terminal_geocode),
                    effective: m.effective_date,
                });
        }
        for edges in by_initial.values_mut() {
            edges.sort_by_key(|e| e.effective);
        }
        MutationRegistry { by_initial }
    }

    /// The latest mutation of this geocode effective on or before the target
    /// date, if any. A mutation effective after the target date does not
    /// apply: the commune still existed under its old code on that date.
    fn step(&self, geocode: Geocode, target_date: NaiveDate) -> Option<Edge> {
        let edges = self.by_initial.get(&geocode)?;
        edges
            .iter()
            .filter(|e| e.effective <= target_date)
            .last()
            .copied()
    }
}

fn resolve_internal(
    registry: &MutationRegistry,
    start: Geocode,
    target_date: NaiveDate,
) -> Result<Geocode, ResolutionErrors> {
    let mut cur = start;
    let mut seen: HashSet<Geocode> = HashSet::new();
    seen.insert(cur);
    while let Some(edge) = registry.step(cur, target_date) {
        if edge.terminal == cur {
            // A mutation that keeps the geocode (boundary or name change).
            break;
        }
        if !seen.insert(edge.terminal) {
            warn!(
                "resolve: mutation cycle through {:?} while resolving {:?}",
                edge.terminal, start
            );
            return Err(ResolutionErrors::NoConvergence(start.0));
        }
        debug!(
            "resolve: {:?} -> {:?} (effective {})",
            cur, edge.terminal, edge.effective
        );
        cur = edge.terminal;
    }
    Ok(cur)
}

/// Resolves a single geocode to the canonical geocode valid on the target
/// date, following the mutation chain transitively.
///
/// A geocode with no applicable mutation resolves to itself. The result is
/// idempotent: resolving the returned code again is a no-op.
pub fn resolve_geocode(
    geocode: u32,
    target_date: NaiveDate,
    mutations: &[Mutation],
) -> Result<u32, ResolutionErrors> {
    let registry = MutationRegistry::build(mutations);
    resolve_internal(&registry, Geocode(geocode), target_date).map(|g| g.0)
}

/// Runs the harmonization of the given line stops against the reference data.
///
/// Arguments:
/// * `stops` the line-municipality lists to harmonize, possibly listing
///   historical geocodes
/// * `mutations` the communal mutations to resolve against
/// * `communes` the communes valid on the target date; a resolved geocode
///   absent from this list is an error
/// * `target_date` the voting date the geocodes must be valid on
pub fn run_harmonization(
    stops: &[LineStop],
    mutations: &[Mutation],
    communes: &[Commune],
    target_date: NaiveDate,
) -> Result<HarmonizationResult, ResolutionErrors> {
    info!(
        "run_harmonization: processing {:?} stops against {:?} mutations and {:?} communes, target date {}",
        stops.len(),
        mutations.len(),
        communes.len(),
        target_date
    );
    if communes.is_empty() {
        return Err(ResolutionErrors::EmptyReference);
    }

    let registry = MutationRegistry::build(mutations);
    let by_geocode: HashMap<Geocode, &Commune> = communes
        .iter()
        .map(|c| (Geocode(c.geocode), c))
        .collect();

    let mut resolved: Vec<HarmonizedStop> = Vec::new();
    for stop in stops.iter() {
        let canonical = resolve_internal(&registry, Geocode(stop.geocode), target_date)?;
        let commune = match by_geocode.get(&canonical) {
            Some(c) => c,
            None => {
                warn!(
                    "run_harmonization: stop {:?}/{:?} resolves to {:?} which is not in the reference",
                    stop.line, stop.geocode, canonical
                );
                return Err(ResolutionErrors::UnknownGeocode(canonical.0));
            }
        };
        if canonical.0 != stop.geocode {
            debug!(
                "run_harmonization: {:?} stop {:?} harmonized to {:?} ({})",
                stop.line, stop.geocode, canonical.0, commune.name
            );
        }
        resolved.push(HarmonizedStop {
            line: stop.line.clone(),
            order: stop.order,
            historical_geocode: stop.geocode,
            geocode: canonical.0,
            name: commune.name.clone(),
            region_code: commune.region_code,
        });
    }

    // Within a line, several historical stops may have merged into the same
    // current commune. Keep the stop with the lowest order and report the
    // group so that downstream aggregation can sum instead of overwrite.
    resolved.sort_by(|a, b| (a.line.as_str(), a.order).cmp(&(b.line.as_str(), b.order)));

    let mut kept: Vec<HarmonizedStop> = Vec::new();
    let mut merged: HashMap<(String, u32), Vec<u32>> = HashMap::new();
    for stop in resolved.into_iter() {
        let group = merged
            .entry((stop.line.clone(), stop.geocode))
            .or_default();
        group.push(stop.historical_geocode);
        if group.len() == 1 {
            kept.push(stop);
        } else {
            warn!(
                "run_harmonization: {:?} stop {:?} duplicates geocode {:?}, keeping the earlier stop",
                stop.line, stop.historical_geocode, stop.geocode
            );
        }
    }

    let mut duplicates: Vec<DuplicateTarget> = merged
        .into_iter()
        .filter(|(_, merged_from)| merged_from.len() > 1)
        .map(|((line, geocode), merged_from)| DuplicateTarget {
            line,
            geocode,
            merged_from,
        })
        .collect();
    duplicates.sort_by(|a, b| (a.line.as_str(), a.geocode).cmp(&(b.line.as_str(), b.geocode)));

    info!(
        "run_harmonization: {:?} stops kept, {:?} duplicate targets",
        kept.len(),
        duplicates.len()
    );
    Ok(HarmonizationResult {
        stops: kept,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn chain_mutations() -> Vec<Mutation> {
        vec![
            Mutation {
                initial_geocode: 1001,
                terminal_geocode: 2002,
                effective_date: date("2015-01-01"),
            },
            Mutation {
                initial_geocode: 2002,
                terminal_geocode: 3003,
                effective_date: date("2018-01-01"),
            },
        ]
    }

    #[test]
    fn resolve_follows_the_full_chain() {
        let mutations = chain_mutations();
        let resolved = resolve_geocode(1001, date("2020-01-01"), &mutations).unwrap();
        assert_eq!(resolved, 3003);
    }

    #[test]
    fn resolve_stops_at_the_target_date() {
        let mutations = chain_mutations();
        // The second mutation is not effective yet in 2016.
        let resolved = resolve_geocode(1001, date("2016-06-01"), &mutations).unwrap();
        assert_eq!(resolved, 2002);
        // Before the first mutation, the historical code is still valid.
        let resolved = resolve_geocode(1001, date("2014-12-31"), &mutations).unwrap();
        assert_eq!(resolved, 1001);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mutations = chain_mutations();
        let once = resolve_geocode(1001, date("2020-01-01"), &mutations).unwrap();
        let twice = resolve_geocode(once, date("2020-01-01"), &mutations).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_without_mutations_is_the_identity() {
        let resolved = resolve_geocode(5586, date("2020-01-01"), &[]).unwrap();
        assert_eq!(resolved, 5586);
    }

    #[test]
    fn resolve_takes_the_latest_applicable_mutation() {
        // The same initial code mutated twice: the later mutation wins.
        let mutations = vec![
            Mutation {
                initial_geocode: 1001,
                terminal_geocode: 2002,
                effective_date: date("2010-01-01"),
            },
            Mutation {
                initial_geocode: 1001,
                terminal_geocode: 4004,
                effective_date: date("2019-01-01"),
            },
        ];
        let resolved = resolve_geocode(1001, date("2020-01-01"), &mutations).unwrap();
        assert_eq!(resolved, 4004);
    }

    #[test]
    fn resolve_detects_cycles() {
        let mutations = vec![
            Mutation {
                initial_geocode: 1001,
                terminal_geocode: 2002,
                effective_date: date("2015-01-01"),
            },
            Mutation {
                initial_geocode: 2002,
                terminal_geocode: 1001,
                effective_date: date("2016-01-01"),
            },
        ];
        let res = resolve_geocode(1001, date("2020-01-01"), &mutations);
        assert_eq!(res, Err(ResolutionErrors::NoConvergence(1001)));
    }

    #[test]
    fn harmonization_maps_stops_to_canonical_communes() {
        let mut builder = Builder::new();
        builder.add_commune(3003, "Grandfontaine", 26).unwrap();
        builder.add_commune(5586, "Lausanne", 22).unwrap();
        builder
            .add_mutation(1001, 2002, date("2015-01-01"))
            .unwrap();
        builder
            .add_mutation(2002, 3003, date("2018-01-01"))
            .unwrap();
        builder.add_stop("ic_1", 1, 5586).unwrap();
        builder.add_stop("ic_1", 2, 1001).unwrap();

        let res = builder.harmonize(date("2020-11-29")).unwrap();
        assert_eq!(res.stops.len(), 2);
        assert_eq!(res.stops[0].geocode, 5586);
        assert_eq!(res.stops[0].historical_geocode, 5586);
        assert_eq!(res.stops[1].geocode, 3003);
        assert_eq!(res.stops[1].historical_geocode, 1001);
        assert_eq!(res.stops[1].name, "Grandfontaine");
        assert!(res.duplicates.is_empty());
    }

    #[test]
    fn harmonization_reports_unknown_geocodes() {
        let mut builder = Builder::new();
        builder.add_commune(5586, "Lausanne", 22).unwrap();
        builder.add_stop("ic_1", 1, 9999).unwrap();

        let res = builder.harmonize(date("2020-11-29"));
        assert_eq!(res, Err(ResolutionErrors::UnknownGeocode(9999)));
    }

    #[test]
    fn harmonization_rejects_an_empty_reference() {
        let stops = vec![LineStop {
            line: "ic_1".to_string(),
            order: 1,
            geocode: 5586,
        }];
        let res = run_harmonization(&stops, &[], &[], date("2020-11-29"));
        assert_eq!(res, Err(ResolutionErrors::EmptyReference));
    }

    #[test]
    fn harmonization_keeps_the_lowest_order_on_duplicates() {
        let mut builder = Builder::new();
        builder.add_commune(3003, "Grandfontaine", 26).unwrap();
        builder
            .add_mutation(1001, 3003, date("2015-01-01"))
            .unwrap();
        builder
            .add_mutation(1002, 3003, date("2015-01-01"))
            .unwrap();
        builder.add_stop("ic_1", 4, 1001).unwrap();
        builder.add_stop("ic_1", 5, 1002).unwrap();

        let res = builder.harmonize(date("2020-11-29")).unwrap();
        assert_eq!(res.stops.len(), 1);
        assert_eq!(res.stops[0].order, 4);
        assert_eq!(res.stops[0].historical_geocode, 1001);
        assert_eq!(
            res.duplicates,
            vec![DuplicateTarget {
                line: "ic_1".to_string(),
                geocode: 3003,
                merged_from: vec![1001, 1002],
            }]
        );
    }

    #[test]
    fn harmonization_keeps_lines_separate() {
        // The same commune on two lines is not a duplicate.
        let mut builder = Builder::new();
        builder.add_commune(5586, "Lausanne", 22).unwrap();
        builder.add_stop("ic_1", 3, 5586).unwrap();
        builder.add_stop("ic_21", 7, 5586).unwrap();

        let res = builder.harmonize(date("2020-11-29")).unwrap();
        assert_eq!(res.stops.len(), 2);
        assert!(res.duplicates.is_empty());
    }

    #[test]
    fn harmonization_orders_stops_by_line_then_order() {
        let mut builder = Builder::new();
        builder.add_commune(1061, "Olten", 11).unwrap();
        builder.add_commune(2701, "Bâle", 12).unwrap();
        builder.add_commune(5586, "Lausanne", 22).unwrap();
        builder.add_stop("ic_21", 2, 1061).unwrap();
        builder.add_stop("ic_1", 9, 1061).unwrap();
        builder.add_stop("ic_21", 1, 2701).unwrap();
        builder.add_stop("ic_1", 3, 5586).unwrap();

        let res = builder.harmonize(date("2020-11-29")).unwrap();
        let keys: Vec<(String, u32)> = res
            .stops
            .iter()
            .map(|s| (s.line.clone(), s.order))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("ic_1".to_string(), 3),
                ("ic_1".to_string(), 9),
                ("ic_21".to_string(), 1),
                ("ic_21".to_string(), 2),
            ]
        );
    }
}
