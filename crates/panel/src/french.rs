//! Parsing of Ken French data library CSV files.
//!
//! The library ships each dataset as a CSV with free-text preamble, a monthly
//! table whose header starts with an empty field, and further (annual) tables
//! after a blank line. Only the first table is read.

use std::{fs, path::Path};

use famafrench_primitives::{DATE_COLUMN, Date};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{PanelError, merge_panels};

/// Missing-value markers used by the data library.
const MISSING_SENTINELS: [f64; 2] = [-99.99, -999.0];

/// Units of the numeric cells in a source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Values are percentages (`1.23` means 1.23%).
    #[default]
    Percent,
    /// Values are already decimal fractions.
    Decimal,
}

impl Units {
    /// Convert a raw value to a decimal fraction.
    #[must_use]
    pub const fn to_decimal(self, value: f64) -> f64 {
        match self {
            Self::Percent => value / 100.0,
            Self::Decimal => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateFormat {
    Monthly,
    Daily,
}

/// Parse the first table of a Ken French CSV into a panel.
///
/// The date column becomes `date` (first of the month for `YYYYMM` rows),
/// every other column is `Float64` in decimal units. Unparsable cells and the
/// library's missing-value sentinels become null. Rows are sorted by date.
///
/// # Errors
/// Returns an error if no table header is found, a date is malformed, or the
/// table has no rows.
pub fn parse_french_table(text: &str, units: Units) -> Result<DataFrame, PanelError> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines.iter().position(|l| is_table_header(l)).ok_or(PanelError::NoTable)?;
    let end = lines[header + 1..]
        .iter()
        .position(|l| l.trim().is_empty())
        .map_or(lines.len(), |offset| header + 1 + offset);
    let block = lines[header..end].join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(block.as_bytes());

    let names: Vec<String> =
        reader.headers()?.iter().skip(1).map(|h| h.trim_matches('"').trim().to_string()).collect();

    let mut date_format = None;
    let mut dates: Vec<Date> = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    let mut sentinels = 0usize;

    for record in reader.records() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default().trim_matches('"');
        let (date, row_format) = parse_french_date(raw_date)?;
        match date_format {
            None => date_format = Some(row_format),
            Some(f) if f != row_format => {
                return Err(PanelError::InvalidDate(format!(
                    "{raw_date} mixes monthly and daily dates"
                )));
            }
            Some(_) => {}
        }
        dates.push(date);

        for (j, column) in values.iter_mut().enumerate() {
            let raw = record.get(j + 1).and_then(|cell| cell.trim_matches('"').parse::<f64>().ok());
            let value = match raw {
                Some(v) if MISSING_SENTINELS.contains(&v) => {
                    sentinels += 1;
                    None
                }
                Some(v) if v.is_finite() => Some(units.to_decimal(v)),
                _ => None,
            };
            column.push(value);
        }
    }

    if dates.is_empty() {
        return Err(PanelError::EmptyTable(names.join(",")));
    }
    if sentinels > 0 {
        tracing::warn!(sentinels, "treated missing-value sentinels as null");
    }

    let mut columns = Vec::with_capacity(names.len() + 1);
    columns.push(Column::new(DATE_COLUMN.into(), dates));
    for (name, column) in names.iter().zip(values) {
        columns.push(Column::new(name.as_str().into(), column));
    }

    let df = DataFrame::new(columns)?
        .lazy()
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    tracing::debug!(rows = df.height(), columns = names.len(), "parsed Ken French table");
    Ok(df)
}

/// Read a Ken French CSV file and parse its first table.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_french_file(path: impl AsRef<Path>, units: Units) -> Result<DataFrame, PanelError> {
    let bytes = fs::read(path.as_ref())?;
    parse_french_table(&String::from_utf8_lossy(&bytes), units)
}

/// Build the factor panel from the three-factor table and, optionally, the
/// momentum table.
///
/// Both tables are in percent; the result is in decimals, restricted to the
/// months present in both.
///
/// # Errors
/// Returns an error if either table fails to parse or the tables share no
/// month.
pub fn load_factors(ff3: &str, momentum: Option<&str>) -> Result<DataFrame, PanelError> {
    let factors = parse_french_table(ff3, Units::Percent)?;
    match momentum {
        Some(text) => merge_panels(&factors, &parse_french_table(text, Units::Percent)?),
        None => Ok(factors),
    }
}

/// Build the portfolio return panel from a portfolio table in percent.
///
/// # Errors
/// Returns an error if the table fails to parse.
pub fn load_portfolios(text: &str) -> Result<DataFrame, PanelError> {
    parse_french_table(text, Units::Percent)
}

fn is_table_header(line: &str) -> bool {
    let s = line.trim();
    if !s.starts_with(',') {
        return false;
    }
    let parts: Vec<&str> = s.split(',').map(|p| p.trim().trim_matches('"')).collect();
    if parts.len() < 2 {
        return false;
    }
    let boilerplate = parts.iter().any(|p| {
        let lower = p.to_lowercase();
        lower.contains("copyright") || lower.contains("ken french")
    });
    !boilerplate && parts[1..].iter().any(|p| p.chars().any(|c| c.is_ascii_alphabetic()))
}

fn parse_french_date(raw: &str) -> Result<(Date, DateFormat), PanelError> {
    let invalid = || PanelError::InvalidDate(raw.to_string());
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = raw.get(..4).and_then(|y| y.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = raw.get(4..6).and_then(|m| m.parse().ok()).ok_or_else(invalid)?;
    match raw.len() {
        6 => Date::from_ymd_opt(year, month, 1)
            .map(|d| (d, DateFormat::Monthly))
            .ok_or_else(invalid),
        8 => {
            let day: u32 = raw[6..].parse().map_err(|_| invalid())?;
            Date::from_ymd_opt(year, month, day).map(|d| (d, DateFormat::Daily)).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;
    use crate::panel_dates;

    const FF3: &str = "This file was created by CMPT_ME_BEME_RETS using the 202401 CRSP database.
The 1-month TBill return is from Ibbotson and Associates, Inc.

,Mkt-RF,SMB,HML,RF
192607,    2.96,   -2.56,   -2.43,    0.22
192608,    2.64,   -1.17,    3.82,    0.25
192609,    0.36,   -1.40,    0.13,    0.23

 Annual Factors: January-December
,Mkt-RF,SMB,HML,RF
1927,   29.47,   -2.46,   -3.75,    3.12
";

    const MOM: &str = "Momentum factor
Copyright 2024 Kenneth R. French

,Mom
192608,    1.00
192609,   -0.50
192610,    2.50

";

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn parses_first_table_only() {
        let df = parse_french_table(FF3, Units::Percent).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(names(&df), ["date", "Mkt-RF", "SMB", "HML", "RF"]);

        let mkt = column(&df, "Mkt-RF");
        assert_relative_eq!(mkt[0].unwrap(), 0.0296);
        assert_relative_eq!(mkt[2].unwrap(), 0.0036);

        let dates = panel_dates(&df).unwrap();
        assert_eq!(dates[0], Date::from_ymd_opt(1926, 7, 1).unwrap());
    }

    #[test]
    fn decimal_units_are_untouched() {
        let df = parse_french_table(FF3, Units::Decimal).unwrap();
        assert_relative_eq!(column(&df, "RF")[1].unwrap(), 0.25);
    }

    #[test]
    fn header_skips_copyright_and_trims_names() {
        let df = parse_french_table(MOM, Units::Percent).unwrap();
        assert_eq!(names(&df), ["date", "Mom"]);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn sentinels_become_null() {
        let text = ",SMALL LoBM,BIG HiBM\n192607,1.50,-99.99\n192608,-999,2.00\n";
        let df = parse_french_table(text, Units::Percent).unwrap();

        assert_eq!(column(&df, "SMALL LoBM"), [Some(0.015), None]);
        assert_eq!(column(&df, "BIG HiBM"), [None, Some(0.02)]);
    }

    #[test]
    fn unparsable_cells_become_null() {
        let text = ",A\n192607,n/a\n192608,1.0\n";
        let df = parse_french_table(text, Units::Decimal).unwrap();
        assert_eq!(column(&df, "A"), [None, Some(1.0)]);
    }

    #[test]
    fn rows_are_sorted_by_date() {
        let text = ",A\n192609,3.0\n192607,1.0\n192608,2.0\n";
        let df = parse_french_table(text, Units::Decimal).unwrap();
        assert_eq!(column(&df, "A"), [Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn load_factors_joins_momentum() {
        let df = load_factors(FF3, Some(MOM)).unwrap();

        // Only 1926-08 and 1926-09 are in both tables.
        assert_eq!(df.height(), 2);
        assert_eq!(names(&df), ["date", "Mkt-RF", "SMB", "HML", "RF", "Mom"]);
        assert_relative_eq!(column(&df, "Mom")[0].unwrap(), 0.01);
    }

    #[test]
    fn missing_header_is_an_error() {
        let err = parse_french_table("no table here\n1,2,3\n", Units::Percent).unwrap_err();
        assert!(matches!(err, PanelError::NoTable));
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = parse_french_table(",A,B\n\n192607,1,2\n", Units::Percent).unwrap_err();
        assert!(matches!(err, PanelError::EmptyTable(_)));
    }

    #[rstest]
    #[case("192607", Date::from_ymd_opt(1926, 7, 1).unwrap(), DateFormat::Monthly)]
    #[case("20240131", Date::from_ymd_opt(2024, 1, 31).unwrap(), DateFormat::Daily)]
    fn parses_dates(#[case] raw: &str, #[case] date: Date, #[case] format: DateFormat) {
        assert_eq!(parse_french_date(raw).unwrap(), (date, format));
    }

    #[rstest]
    #[case("1927")]
    #[case("192613")]
    #[case("2024-01")]
    #[case("")]
    fn rejects_bad_dates(#[case] raw: &str) {
        assert!(matches!(parse_french_date(raw), Err(PanelError::InvalidDate(_))));
    }

    #[test]
    fn mixed_date_formats_are_rejected() {
        let text = ",A\n192607,1.0\n19260801,2.0\n";
        assert!(matches!(
            parse_french_table(text, Units::Decimal),
            Err(PanelError::InvalidDate(_))
        ));
    }
}
