// Retrieval of the federal reference data and the voting results over HTTP.

use std::time::Duration;

use chrono::NaiveDate;
use log::info;
use snafu::prelude::*;

use crate::pipeline::*;

const MUTATIONS_ENDPOINT: &str = "https://www.agvchapp.bfs.admin.ch/api/communes/mutations";
const GEOLEVELS_ENDPOINT: &str =
    "https://sms.bfs.admin.ch/WcfBFSSpecificService.svc/AnonymousRest/communes/levels";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The mutation-registry export for the given period. Territory exchanges
/// are excluded: they move parcels between communes without retiring a
/// geocode.
pub fn mutations_url(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}?includeTerritoryExchange=false&Deleted=True&Created=True&startPeriod={}&endPeriod={}",
        MUTATIONS_ENDPOINT,
        start.format("%d-%m-%Y"),
        end.format("%d-%m-%Y")
    )
}

/// The geolevels snapshot for the given date, with French labels.
pub fn geolevels_url(date: NaiveDate) -> String {
    let d = date.format("%d-%m-%Y");
    format!(
        "{}?startPeriod={}&endPeriod={}&useBfsCode=false&labelLanguages=fr&format=csv",
        GEOLEVELS_ENDPOINT, d, d
    )
}

/// Fetches a URL and returns the response body. Any network or HTTP-status
/// failure aborts the run: the analyst re-runs once connectivity is back.
pub fn get_text(url: &str) -> PipeResult<String> {
    info!("Fetching {:?}", url);
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context(FetchingSnafu { url })?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .context(FetchingSnafu { url })?;
    response.text().context(FetchingSnafu { url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_mutation_period_url() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 11, 24).unwrap();
        let url = mutations_url(start, end);
        assert!(url.starts_with("https://www.agvchapp.bfs.admin.ch/api/communes/mutations?"));
        assert!(url.contains("includeTerritoryExchange=false"));
        assert!(url.contains("startPeriod=01-01-2024"));
        assert!(url.contains("endPeriod=24-11-2024"));
    }

    #[test]
    fn builds_the_geolevels_url() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 24).unwrap();
        let url = geolevels_url(date);
        assert!(url.contains("startPeriod=24-11-2024"));
        assert!(url.contains("endPeriod=24-11-2024"));
        assert!(url.contains("labelLanguages=fr"));
        assert!(url.contains("format=csv"));
    }
}
