use chrono::NaiveDate;

/// Removes a trailing canton abbreviation from a commune name,
/// e.g. "Morges (VD)" -> "Morges".
pub fn strip_canton_abbreviation(name: &str) -> String {
    if let Some(head) = name.strip_suffix(')') {
        if let Some((stem, abbr)) = head.rsplit_once(" (") {
            if abbr.len() == 2 && abbr.chars().all(|c| c.is_ascii_uppercase()) {
                return stem.to_string();
            }
        }
    }
    name.to_string()
}

/// Parses the date formats found across the federal exports. The mutation
/// registry uses DD.MM.YYYY, other endpoints DD-MM-YYYY or ISO dates.
pub fn parse_swiss_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    for fmt in ["%d.%m.%Y", "%d-%m-%Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_canton_abbreviations() {
        assert_eq!(strip_canton_abbreviation("Morges (VD)"), "Morges");
        assert_eq!(strip_canton_abbreviation("Buchs (SG)"), "Buchs");
        // Only a two-letter uppercase suffix is an abbreviation.
        assert_eq!(strip_canton_abbreviation("Lausanne"), "Lausanne");
        assert_eq!(strip_canton_abbreviation("Biel/Bienne"), "Biel/Bienne");
        assert_eq!(
            strip_canton_abbreviation("La Tour-de-Peilz (x)"),
            "La Tour-de-Peilz (x)"
        );
        // The abbreviation is only stripped at the end of the name.
        assert_eq!(
            strip_canton_abbreviation("Stein (AG) Dorf"),
            "Stein (AG) Dorf"
        );
    }

    #[test]
    fn parses_the_federal_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        assert_eq!(parse_swiss_date("01.07.2021"), Some(expected));
        assert_eq!(parse_swiss_date("01-07-2021"), Some(expected));
        assert_eq!(parse_swiss_date("2021-07-01"), Some(expected));
        assert_eq!(parse_swiss_date(" 2021-07-01 "), Some(expected));
        assert_eq!(parse_swiss_date("July 1st"), None);
    }
}
