pub use crate::config::*;

use chrono::NaiveDate;

/// A builder for assembling reference data and line stops.
///
/// Using the builder should be considered for tests and for embedding the
/// library, when the data does not come from the federal CSV files.
///
/// ```
/// pub use swiss_communes::builder::Builder;
/// use chrono::NaiveDate;
/// # use swiss_communes::ResolutionErrors;
///
/// let mut builder = Builder::new();
/// builder.add_commune(2002, "Bussigny", 22)?;
/// builder.add_mutation(1001, 2002, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())?;
/// builder.add_stop("ic_1", 4, 1001)?;
///
/// let result = builder.harmonize(NaiveDate::from_ymd_opt(2020, 11, 29).unwrap())?;
/// assert_eq!(result.stops[0].geocode, 2002);
/// # Ok::<(), ResolutionErrors>(())
/// ```
pub struct Builder {
    pub(crate) _mutations: Vec<Mutation>,
    pub(crate) _communes: Vec<Commune>,
    pub(crate) _stops: Vec<LineStop>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _mutations: Vec::new(),
            _communes: Vec::new(),
            _stops: Vec::new(),
        }
    }

    /// Adds a commune to the reference list.
    pub fn add_commune(
        &mut self,
        geocode: u32,
        name: &str,
        region_code: u32,
    ) -> Result<(), ResolutionErrors> {
        self._communes.push(Commune {
            geocode,
            name: name.to_string(),
            region_code,
        });
        Ok(())
    }

    /// Adds a mutation edge. Chains are assembled at resolution time, the
    /// mutations may be added in any order.
    pub fn add_mutation(
        &mut self,
        initial_geocode: u32,
        terminal_geocode: u32,
        effective_date: NaiveDate,
    ) -> Result<(), ResolutionErrors> {
        self._mutations.push(Mutation {
            initial_geocode,
            terminal_geocode,
            effective_date,
        });
        Ok(())
    }

    /// Adds a stop to a line-municipality list.
    pub fn add_stop(&mut self, line: &str, order: u32, geocode: u32) -> Result<(), ResolutionErrors> {
        self._stops.push(LineStop {
            line: line.to_string(),
            order,
            geocode,
        });
        Ok(())
    }

    /// Resolves all the stops against the assembled reference data.
    pub fn harmonize(&self, target_date: NaiveDate) -> Result<HarmonizationResult, ResolutionErrors> {
        crate::run_harmonization(&self._stops, &self._mutations, &self._communes, target_date)
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}
