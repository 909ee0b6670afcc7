// Primitives for reading and writing the CSV tables.

use std::collections::HashMap;
use std::io;

use csv::ReaderBuilder;
use log::debug;
use serde::Serialize;
use snafu::prelude::*;

use swiss_communes::{Commune, LineStop, Mutation};

use crate::pipeline::{io_common::parse_swiss_date, *};

fn header_index(headers: &csv::StringRecord, column: &str, path: &str) -> PipeResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .context(MissingColumnSnafu { column, path })
}

fn parse_u32(field: Option<&str>, lineno: usize) -> PipeResult<u32> {
    let text = field.context(CsvLineTooShortSnafu { lineno })?.trim();
    if let Ok(x) = text.parse::<u32>() {
        return Ok(x);
    }
    // Exports that went through a spreadsheet tool sometimes carry the codes
    // as floats ("5586.0").
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= 0.0 => Ok(f as u32),
        _ => ParsingNumberSnafu { text }.fail(),
    }
}

/// Reads one line-municipality list. The order and geocode columns are
/// looked up by name in the header row.
pub fn read_line_stops(ls: &LineSource) -> PipeResult<Vec<LineStop>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(&ls.file_path)
        .context(CsvOpenSnafu {
            path: ls.file_path.clone(),
        })?;
    let headers = rdr.headers().context(CsvLineParseSnafu {})?.clone();
    let order_idx = header_index(&headers, &ls.order_column, &ls.file_path)?;
    let geocode_idx = header_index(&headers, &ls.geocode_column(), &ls.file_path)?;

    let mut res: Vec<LineStop> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header occupies the first line of the file.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_line_stops: {:?} {:?}", lineno, line);
        res.push(LineStop {
            line: ls.name.clone(),
            order: parse_u32(line.get(order_idx), lineno)?,
            geocode: parse_u32(line.get(geocode_idx), lineno)?,
        });
    }
    Ok(res)
}

/// Parses the mutation export of the federal registry of communes.
pub fn parse_mutations<R: io::Read>(input: R) -> PipeResult<Vec<Mutation>> {
    let mut rdr = ReaderBuilder::new().from_reader(input);
    let headers = rdr.headers().context(CsvLineParseSnafu {})?.clone();
    let initial_idx = header_index(&headers, "InitialCode", "the mutation export")?;
    let terminal_idx = header_index(&headers, "TerminalCode", "the mutation export")?;
    let date_idx = header_index(&headers, "MutationDate", "the mutation export")?;

    let mut res: Vec<Mutation> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let date_text = line
            .get(date_idx)
            .context(CsvLineTooShortSnafu { lineno })?;
        let effective_date =
            parse_swiss_date(date_text).context(ParsingDateSnafu { text: date_text })?;
        res.push(Mutation {
            initial_geocode: parse_u32(line.get(initial_idx), lineno)?,
            terminal_geocode: parse_u32(line.get(terminal_idx), lineno)?,
            effective_date,
        });
    }
    Ok(res)
}

/// Parses the geolevels export: the communes valid on the reference date,
/// with their French name and first-level region code.
pub fn parse_communes<R: io::Read>(input: R) -> PipeResult<Vec<Commune>> {
    let mut rdr = ReaderBuilder::new().from_reader(input);
    let headers = rdr.headers().context(CsvLineParseSnafu {})?.clone();
    let geocode_idx = header_index(&headers, "CODE_OFS", "the geolevels export")?;
    let name_idx = header_index(&headers, "Name_fr", "the geolevels export")?;
    let region_idx = header_index(&headers, "HR_HGDE_HIST_L1", "the geolevels export")?;

    let mut res: Vec<Commune> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let name = line
            .get(name_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        res.push(Commune {
            geocode: parse_u32(line.get(geocode_idx), lineno)?,
            name,
            region_code: parse_u32(line.get(region_idx), lineno)?,
        });
    }
    Ok(res)
}

/// Reads the canton table: first-level region code to ISO2 abbreviation.
pub fn read_cantons(path: &str) -> PipeResult<HashMap<u32, String>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers = rdr.headers().context(CsvLineParseSnafu {})?.clone();
    let region_idx = header_index(&headers, "order", path)?;
    let iso2_idx = header_index(&headers, "iso2", path)?;

    let mut res: HashMap<u32, String> = HashMap::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let iso2 = line
            .get(iso2_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        res.insert(parse_u32(line.get(region_idx), lineno)?, iso2);
    }
    Ok(res)
}

/// Reads the translation table, keyed by the official French name.
pub fn read_translations(path: &str) -> PipeResult<HashMap<String, Translation>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers = rdr.headers().context(CsvLineParseSnafu {})?.clone();
    let name_idx = header_index(&headers, "polg_name", path)?;
    let fr_idx = header_index(&headers, "fr", path)?;
    let de_idx = header_index(&headers, "de", path)?;

    let mut res: HashMap<String, Translation> = HashMap::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let get = |i: usize| -> PipeResult<String> {
            Ok(line
                .get(i)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string())
        };
        res.insert(
            get(name_idx)?,
            Translation {
                fr: get(fr_idx)?,
                de: get(de_idx)?,
            },
        );
    }
    Ok(res)
}

fn write_table<S: Serialize>(path: &str, rows: &[S]) -> PipeResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvOpenSnafu { path })?;
    for row in rows.iter() {
        wtr.serialize(row).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(FlushingCsvSnafu { path })?;
    Ok(())
}

pub fn write_harmonized(path: &str, rows: &[HarmonizedRow]) -> PipeResult<()> {
    write_table(path, rows)
}

pub fn read_harmonized(path: &str) -> PipeResult<Vec<HarmonizedRow>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut res: Vec<HarmonizedRow> = Vec::new();
    for row_r in rdr.deserialize::<HarmonizedRow>() {
        res.push(row_r.context(CsvLineParseSnafu {})?);
    }
    Ok(res)
}

pub fn write_ballot_titles(path: &str, rows: &[ballots::BallotTitleRow]) -> PipeResult<()> {
    write_table(path, rows)
}

pub fn write_final_results(path: &str, rows: &[results::FinalRow]) -> PipeResult<()> {
    write_table(path, rows)
}
