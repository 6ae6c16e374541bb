//! Example: FF3 vs Carhart on a simulated 5x5 panel
//!
//! Builds 25 portfolios whose returns load on all four factors, estimates
//! both models, and shows how adding momentum changes alpha and R².

use chrono::NaiveDate;
use famafrench::{
    model::{ResultsAggregator, compare},
    panel::merge_panels,
    primitives::{DATE_COLUMN, Factor, FactorModel},
};
use polars::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

const MONTHS: usize = 360;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FF3 vs Carhart on simulated portfolios ===\n");

    let mut rng = StdRng::seed_from_u64(1926);
    let factor_noise = Normal::new(0.0, 0.04)?;
    let idio = Normal::new(0.0, 0.01)?;

    let dates: Vec<NaiveDate> = (0..MONTHS)
        .filter_map(|i| NaiveDate::from_ymd_opt(1990 + (i / 12) as i32, (i % 12) as u32 + 1, 1))
        .collect();

    let mut draw = |dist: &Normal<f64>| (0..MONTHS).map(|_| dist.sample(&mut rng)).collect::<Vec<_>>();
    let mkt = draw(&factor_noise);
    let smb = draw(&factor_noise);
    let hml = draw(&factor_noise);
    let mom = draw(&factor_noise);
    let rf = vec![0.003; MONTHS];

    let factors = DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), dates.clone()),
        Column::new(Factor::MarketExcess.column().into(), mkt.clone()),
        Column::new(Factor::Size.column().into(), smb.clone()),
        Column::new(Factor::Value.column().into(), hml.clone()),
        Column::new(Factor::Momentum.column().into(), mom.clone()),
        Column::new("RF".into(), rf.clone()),
    ])?;

    // =========================================================================
    // PORTFOLIO RETURNS
    // =========================================================================

    let mut columns = vec![Column::new(DATE_COLUMN.into(), dates)];
    for size in 0..5 {
        for bm in 0..5 {
            let name = format!("ME{} BM{}", size + 1, bm + 1);
            let s = 0.8 - 0.4 * size as f64;
            let h = -0.5 + 0.3 * bm as f64;
            let m = 0.3 - 0.1 * bm as f64;
            let noise = draw(&idio);
            let returns: Vec<f64> = (0..MONTHS)
                .map(|t| rf[t] + 1.0 * mkt[t] + s * smb[t] + h * hml[t] + m * mom[t] + noise[t])
                .collect();
            columns.push(Column::new(name.as_str().into(), returns));
        }
    }
    let returns = DataFrame::new(columns)?;

    let panel = merge_panels(&returns, &factors)?;
    println!("Estimation panel: {} months x {} columns\n", panel.height(), panel.width());

    // =========================================================================
    // ESTIMATE BOTH MODELS
    // =========================================================================

    let aggregator = ResultsAggregator::new();
    let ff3 = aggregator.run_panels(&returns, &factors, FactorModel::FamaFrench3)?;
    let carhart = aggregator.run_panels(&returns, &factors, FactorModel::Carhart)?;

    println!("{:<10} {:>10} {:>10} {:>10} {:>10}", "portfolio", "alpha_ff3", "alpha_c", "r2_ff3", "r2_c");
    for record in compare(&ff3, &carhart)? {
        println!(
            "{:<10} {:>10.5} {:>10.5} {:>10.4} {:>10.4}",
            record.portfolio.as_str(),
            record.alpha_a,
            record.alpha_b,
            record.r2_a,
            record.r2_b
        );
    }

    let mut frame = carhart.to_frame()?;
    frame.sort_in_place(["r2"], SortMultipleOptions::default())?;
    println!("\nCarhart results, lowest R² first:\n{}", frame.head(Some(5)));

    Ok(())
}
