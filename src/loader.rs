//! Loading of election results from CSV files.
//!
//! Every `.csv` file in the data directory is parsed, in parallel, and the rows are concatenated in
//! file name order. Any unreadable or malformed file fails the whole load: the server never starts
//! with partial data.

use crate::dataset::ElectionData;
use crate::error::ElectionError;
use crate::models::{Candidacy, Year};

use rayon::prelude::*;
use serde::{de, Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{event, Level};

/// A row of a results file.
///
/// Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    /// Falls back to the year in the file name when absent.
    #[serde(rename = "Year", default)]
    year: Option<Year>,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "PC Name", alias = "Constituency")]
    constituency: String,
    #[serde(rename = "Candidate", alias = "Winning Candidate")]
    candidate: String,
    #[serde(rename = "Party")]
    party: String,
    #[serde(rename = "Votes", deserialize_with = "deserialize_count")]
    votes: u64,
    #[serde(
        rename = "Electors",
        default,
        deserialize_with = "deserialize_optional_count"
    )]
    electors: Option<u64>,
    /// Reservation category, e.g. GEN, SC or ST.
    #[serde(rename = "Type", default)]
    constituency_type: Option<String>,
    // Published figures of files that list only winners.
    #[serde(
        rename = "Margin",
        default,
        deserialize_with = "deserialize_optional_count"
    )]
    margin: Option<u64>,
    #[serde(
        rename = "Margin %",
        default,
        deserialize_with = "deserialize_optional_percent"
    )]
    margin_percent: Option<f64>,
    #[serde(
        rename = "Turnout",
        default,
        deserialize_with = "deserialize_optional_percent"
    )]
    turnout: Option<f64>,
}

/// Parse a count that may contain thousands separators, e.g. `1,23,456`.
fn parse_count(raw: &str) -> Result<u64, String> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    digits
        .parse()
        .map_err(|_| format!("invalid count {:?}", raw))
}

/// Parse a percentage with an optional `%` suffix, e.g. `65.79%`.
fn parse_percent(raw: &str) -> Result<f64, String> {
    let number = raw.trim().trim_end_matches('%').trim();
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(format!("invalid percentage {:?}", raw)),
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).map_err(de::Error::custom)
}

fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_count(&raw).map_err(de::Error::custom))
        .transpose()
}

fn deserialize_optional_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_percent(&raw).map_err(de::Error::custom))
        .transpose()
}

/// Return the first run of exactly four digits in a file's stem, e.g. 2019 for
/// `lok_sabha_2019_data.csv`.
pub fn year_from_file_name(path: &Path) -> Option<Year> {
    let stem = path.file_stem()?.to_str()?;
    stem.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| extension.eq_ignore_ascii_case("csv"))
}

/// List the CSV files in a directory, sorted by path.
fn csv_paths(dir: &Path) -> Result<Vec<PathBuf>, ElectionError> {
    let read_error = |source: std::io::Error| ElectionError::DataRead {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && is_csv(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every CSV file in a directory into an [ElectionData] snapshot.
///
/// # Arguments
///
/// * `dir`: Directory containing the results files
pub fn load_dir(dir: &Path) -> Result<ElectionData, ElectionError> {
    let paths = csv_paths(dir)?;
    if paths.is_empty() {
        return Err(ElectionError::NoDataFiles {
            path: dir.to_path_buf(),
        });
    }
    // Collecting a parallel iterator preserves the input order.
    let files = paths
        .par_iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let data = ElectionData::new(files.into_iter().flatten().collect());
    event!(
        Level::INFO,
        "Loaded {} records from {} files for years {:?}",
        data.records().len(),
        paths.len(),
        data.years()
    );
    Ok(data)
}

/// Load the rows of a single CSV file.
pub fn load_file(path: &Path) -> Result<Vec<Candidacy>, ElectionError> {
    let file = File::open(path).map_err(|source| ElectionError::DataRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_csv(file, path)?;
    event!(
        Level::DEBUG,
        "Loaded {} rows from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

/// Parse CSV data into rows.
///
/// # Arguments
///
/// * `reader`: Source of the CSV data
/// * `path`: Path the data was read from, used for the default year and in errors
pub fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Vec<Candidacy>, ElectionError> {
    let parse_error = |source: csv::Error| ElectionError::DataParse {
        path: path.to_path_buf(),
        source,
    };
    let format_error = |line: u64, reason: &str| ElectionError::DataFormat {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let file_year = year_from_file_name(path);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers().map_err(parse_error)?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();
    while reader.read_record(&mut record).map_err(parse_error)? {
        let line = record.position().map_or(0, |position| position.line());
        let row: CsvRow = record.deserialize(Some(&headers)).map_err(parse_error)?;
        let year = row
            .year
            .or(file_year)
            .ok_or_else(|| format_error(line, "no Year column and no year in the file name"))?;
        if row.state.is_empty() {
            return Err(format_error(line, "state is empty"));
        }
        if row.constituency.is_empty() {
            return Err(format_error(line, "constituency is empty"));
        }
        if row.party.is_empty() {
            return Err(format_error(line, "party is empty"));
        }
        rows.push(Candidacy {
            year,
            state: row.state,
            constituency: row.constituency,
            party: row.party,
            candidate: row.candidate,
            votes: row.votes,
            electors: row.electors,
            constituency_type: row.constituency_type.filter(|kind| !kind.is_empty()),
            margin: row.margin,
            margin_percent: row.margin_percent,
            turnout: row.turnout,
        });
    }
    Ok(rows)
}
