// ********* Input data structures ***********

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::Display;

/// A communal mutation as recorded in the federal registry of communes.
///
/// A mutation retires the initial geocode and transfers its territory to the
/// terminal geocode, starting from the effective date. Several initial codes
/// may share the same terminal code (a merger), and a terminal code may
/// itself be retired by a later mutation (a chain).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Mutation {
    pub initial_geocode: u32,
    pub terminal_geocode: u32,
    pub effective_date: NaiveDate,
}

/// A commune valid on the reference date.
///
/// `region_code` is the first-level spatial grouping of the commune (the
/// canton in the federal geolevels nomenclature). It is carried through
/// verbatim so that callers can join their own canton tables.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Commune {
    pub geocode: u32,
    pub name: String,
    pub region_code: u32,
}

/// One entry of a line-municipality list: the commune at position `order`
/// along the named line. The geocode may be historical.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LineStop {
    pub line: String,
    pub order: u32,
    pub geocode: u32,
}

// ******** Output data structures *********

/// A line stop after resolution: `geocode` is the canonical code valid on
/// the target date, `historical_geocode` the code the stop was listed under.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HarmonizedStop {
    pub line: String,
    pub order: u32,
    pub historical_geocode: u32,
    pub geocode: u32,
    pub name: String,
    pub region_code: u32,
}

/// Several historical stops of one line resolved to the same current
/// commune. The surviving stop is the one with the lowest order; downstream
/// aggregation must sum over `merged_from` rather than overwrite.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DuplicateTarget {
    pub line: String,
    pub geocode: u32,
    pub merged_from: Vec<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HarmonizationResult {
    /// Sorted by line, then by order. At most one stop per (line, geocode).
    pub stops: Vec<HarmonizedStop>,
    pub duplicates: Vec<DuplicateTarget>,
}

/// Errors that prevent the harmonization from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ResolutionErrors {
    /// The geocode (after resolution) is absent from the commune reference.
    UnknownGeocode(u32),
    /// The mutation data loops; the chain starting at this geocode does not
    /// reach a terminal code.
    NoConvergence(u32),
    /// The commune reference is empty, nothing can be resolved against it.
    EmptyReference,
}

impl Error for ResolutionErrors {}

impl Display for ResolutionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionErrors::UnknownGeocode(g) => {
                write!(f, "geocode {} is not in the commune reference", g)
            }
            ResolutionErrors::NoConvergence(g) => {
                write!(f, "mutation chain starting at geocode {} does not converge", g)
            }
            ResolutionErrors::EmptyReference => write!(f, "the commune reference is empty"),
        }
    }
}
