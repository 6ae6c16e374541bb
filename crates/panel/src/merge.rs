//! Panel merging.

use std::collections::HashSet;

use chrono::Datelike;
use famafrench_primitives::{DATE_COLUMN, Date};
use polars::prelude::*;

use crate::PanelError;

/// Days from 0001-01-01 to 1970-01-01, the epoch of polars `Date` values.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Inner-join two monthly panels on `date` and drop incomplete rows.
///
/// Every non-key column is cast to `Float64`; a row is kept only if all of its
/// values are present and finite. The result is sorted by date, has unique
/// dates, and keeps the left panel's columns before the right panel's.
///
/// # Errors
/// * [`PanelError::MissingColumn`] / [`PanelError::DateKey`] if either panel
///   lacks a `Date` key
/// * [`PanelError::NotMonthly`] if a key is not the first of a month
/// * [`PanelError::ColumnCollision`] if a value column appears in both panels
/// * [`PanelError::NoOverlap`] if no complete row survives
/// * [`PanelError::DuplicateDate`] if a month appears twice
pub fn merge_panels(left: &DataFrame, right: &DataFrame) -> Result<DataFrame, PanelError> {
    panel_dates(left)?;
    panel_dates(right)?;

    let left_columns = value_columns(left);
    let right_columns = value_columns(right);
    let seen: HashSet<&str> = left_columns.iter().map(String::as_str).collect();
    if let Some(dup) = right_columns.iter().find(|c| seen.contains(c.as_str())) {
        return Err(PanelError::ColumnCollision(dup.clone()));
    }

    let casts: Vec<Expr> = left_columns
        .iter()
        .chain(right_columns.iter())
        .map(|c| col(c.as_str()).cast(DataType::Float64))
        .collect();

    let joined = left
        .clone()
        .lazy()
        .join(
            right.clone().lazy(),
            [col(DATE_COLUMN)],
            [col(DATE_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns(casts)
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let joined_rows = joined.height();
    let keep = complete_rows(&joined)?;
    let merged = joined.filter(&keep)?;

    tracing::info!(
        left = left.height(),
        right = right.height(),
        joined = joined_rows,
        kept = merged.height(),
        "merged panels"
    );

    if merged.height() == 0 {
        return Err(PanelError::NoOverlap { left: left.height(), right: right.height() });
    }

    let dates = panel_dates(&merged)?;
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(PanelError::DuplicateDate(pair[1]));
    }

    Ok(merged)
}

/// Names of every column except the date key, in frame order.
#[must_use]
pub fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| name != DATE_COLUMN)
        .collect()
}

/// Fail fast if any of `columns` is absent from the panel.
///
/// # Errors
/// Returns [`PanelError::MissingColumn`] naming the first absent column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<(), PanelError> {
    let present = value_columns(df);
    match columns.iter().find(|c| !present.iter().any(|p| p == *c)) {
        Some(missing) => Err(PanelError::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}

/// Dates of a monthly panel, in row order.
///
/// # Errors
/// Returns an error if the `date` column is missing, is not of dtype `Date`,
/// holds a null, or holds a day other than the first of a month.
pub fn panel_dates(df: &DataFrame) -> Result<Vec<Date>, PanelError> {
    let column = df
        .column(DATE_COLUMN)
        .map_err(|_| PanelError::MissingColumn(DATE_COLUMN.to_string()))?;
    if column.dtype() != &DataType::Date {
        return Err(PanelError::DateKey(column.dtype().to_string()));
    }

    let days = column.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|d| {
            let d = d.ok_or_else(|| PanelError::InvalidDate("null date".to_string()))?;
            let date = Date::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)
                .ok_or_else(|| PanelError::InvalidDate(d.to_string()))?;
            if date.day() != 1 {
                return Err(PanelError::NotMonthly(date));
            }
            Ok(date)
        })
        .collect()
}

fn complete_rows(df: &DataFrame) -> Result<BooleanChunked, PanelError> {
    let mut keep = vec![true; df.height()];
    for name in value_columns(df) {
        let values = df.column(&name)?.f64()?;
        for (flag, value) in keep.iter_mut().zip(values.into_iter()) {
            if !value.is_some_and(f64::is_finite) {
                *flag = false;
            }
        }
    }
    Ok(BooleanChunked::from_slice("complete".into(), &keep))
}
