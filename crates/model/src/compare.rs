//! Side-by-side comparison of two result tables.

use std::collections::BTreeMap;

use famafrench_primitives::{ComparisonRecord, RegressionResult};
use polars::prelude::*;

use crate::{ModelError, ResultTable};

/// Decimal places kept in comparison output.
const DECIMALS: i32 = 6;

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (value * scale).round() / scale
}

/// Results of a table keyed by portfolio id.
fn by_portfolio(table: &ResultTable) -> Result<BTreeMap<&str, &RegressionResult>, ModelError> {
    let mut map = BTreeMap::new();
    for result in &table.results {
        if map.insert(result.portfolio.as_str(), result).is_some() {
            return Err(ModelError::DuplicatePortfolio(result.portfolio.clone()));
        }
    }
    Ok(map)
}

/// Compare alpha and R² of the portfolios present in both tables.
///
/// Deltas are `b - a`, computed before rounding; every number in the output
/// is rounded to six decimals. Records are sorted by portfolio.
///
/// # Errors
/// Returns [`ModelError::DuplicatePortfolio`] if either table repeats a
/// portfolio and [`ModelError::NoCommonPortfolios`] if the tables share no
/// portfolio.
pub fn compare(a: &ResultTable, b: &ResultTable) -> Result<Vec<ComparisonRecord>, ModelError> {
    let a_by_id = by_portfolio(a)?;
    let b_by_id = by_portfolio(b)?;

    let records: Vec<ComparisonRecord> = a_by_id
        .iter()
        .filter_map(|(id, ra)| b_by_id.get(id).map(|rb| (ra, rb)))
        .map(|(ra, rb)| ComparisonRecord {
            portfolio: ra.portfolio.clone(),
            alpha_a: round(ra.alpha.estimate),
            alpha_b: round(rb.alpha.estimate),
            delta_alpha: round(rb.alpha.estimate - ra.alpha.estimate),
            r2_a: round(ra.r2),
            r2_b: round(rb.r2),
            delta_r2: round(rb.r2 - ra.r2),
        })
        .collect();

    if records.is_empty() {
        return Err(ModelError::NoCommonPortfolios);
    }

    let unmatched = a_by_id.len() + b_by_id.len() - 2 * records.len();
    if unmatched > 0 {
        tracing::warn!(unmatched, "portfolios present in only one result table were skipped");
    }
    tracing::info!(model_a = %a.model, model_b = %b.model, portfolios = records.len(), "compared");

    Ok(records)
}

/// Frame of comparison records with columns
/// `portfolio, alpha_<a>, alpha_<b>, delta_alpha, r2_<a>, r2_<b>, delta_r2`.
///
/// # Errors
/// Returns an error if the two labels coincide.
pub fn comparison_frame(
    records: &[ComparisonRecord],
    label_a: &str,
    label_b: &str,
) -> Result<DataFrame, ModelError> {
    if label_a == label_b {
        return Err(ModelError::InvalidColumn {
            column: format!("alpha_{label_a}"),
            reason: "comparison labels must differ".to_string(),
        });
    }

    let values = |f: fn(&ComparisonRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();
    Ok(DataFrame::new(vec![
        Column::new(
            "portfolio".into(),
            records.iter().map(|r| r.portfolio.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(format!("alpha_{label_a}").into(), values(|r| r.alpha_a)),
        Column::new(format!("alpha_{label_b}").into(), values(|r| r.alpha_b)),
        Column::new("delta_alpha".into(), values(|r| r.delta_alpha)),
        Column::new(format!("r2_{label_a}").into(), values(|r| r.r2_a)),
        Column::new(format!("r2_{label_b}").into(), values(|r| r.r2_b)),
        Column::new("delta_r2".into(), values(|r| r.delta_r2)),
    ])?)
}
