//! famafrench CLI binary.
//!
//! Runs FF3 and Carhart time-series regressions over Ken French portfolio
//! files and compares the two models.
//!
//! Usage: `famafrench run --portfolios P.CSV --factors F.CSV --momentum M.CSV --out-dir reports`

use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Args, Parser, Subcommand};
use famafrench::{
    model::{AggregatorConfig, ResultTable, ResultsAggregator, compare, comparison_frame},
    panel::{load_factors, load_portfolios, merge_panels, read_csv, value_columns, write_csv},
    primitives::FactorModel,
};
use polars::prelude::DataFrame;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "famafrench")]
#[command(about = "Fama-French / Carhart regressions with Newey-West inference", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate one model for every portfolio and write the result table
    Regress {
        /// Factor model (ff3 or carhart)
        #[arg(long, default_value = "ff3")]
        model: FactorModel,

        #[command(flatten)]
        inputs: Inputs,

        /// Output CSV
        #[arg(long)]
        out: PathBuf,
    },

    /// Compare two result tables
    Compare {
        /// Baseline result table
        #[arg(long)]
        a: PathBuf,

        /// Alternative result table
        #[arg(long)]
        b: PathBuf,

        /// Column label of the baseline
        #[arg(long, default_value = "ff3")]
        label_a: String,

        /// Column label of the alternative
        #[arg(long, default_value = "carhart")]
        label_b: String,

        /// Output CSV
        #[arg(long)]
        out: PathBuf,
    },

    /// Estimate FF3 and Carhart and write both tables plus their comparison
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// Output directory
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
struct Inputs {
    /// Ken French 25 portfolio CSV (percent units)
    #[arg(long)]
    portfolios: PathBuf,

    /// Ken French three-factor CSV (percent units)
    #[arg(long)]
    factors: PathBuf,

    /// Ken French momentum CSV (percent units)
    #[arg(long)]
    momentum: Option<PathBuf>,

    /// Newey-West truncation lag
    #[arg(long)]
    lags: Option<usize>,

    /// Run regressions in parallel
    #[arg(long)]
    parallel: bool,

    /// Fail instead of warning when values look like unconverted percentages
    #[arg(long)]
    strict_units: bool,

    /// JSON run configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Merged estimation panel and the portfolio columns to regress.
struct Estimation {
    panel: DataFrame,
    responses: Vec<String>,
}

impl Inputs {
    fn aggregator(&self) -> CliResult<ResultsAggregator> {
        let mut config: AggregatorConfig = match &self.config {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => AggregatorConfig::default(),
        };
        if let Some(lags) = self.lags {
            config.engine.max_lags = lags;
        }
        config.parallel |= self.parallel;
        config.units.strict |= self.strict_units;
        Ok(ResultsAggregator::with_config(config))
    }

    /// Parse the French files and merge them once for every model to run.
    fn load(&self, momentum_required: bool) -> CliResult<Estimation> {
        let returns = load_portfolios(&read_text(&self.portfolios)?)?;
        let momentum = match &self.momentum {
            Some(path) => Some(read_text(path)?),
            None if momentum_required => return Err("the carhart model needs --momentum".into()),
            None => None,
        };
        let factors = load_factors(&read_text(&self.factors)?, momentum.as_deref())?;

        Ok(Estimation { panel: merge_panels(&returns, &factors)?, responses: value_columns(&returns) })
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Regress { model, inputs, out } => {
            let aggregator = inputs.aggregator()?;
            let data = inputs.load(model == FactorModel::Carhart)?;
            let table = aggregator.run(&data.panel, &data.responses, model)?;
            write_table(&table, &out)?;
            print_summary(&table);
        }
        Commands::Compare { a, b, label_a, label_b, out } => {
            let a = ResultTable::from_frame(&read_csv(&a)?)?;
            let b = ResultTable::from_frame(&read_csv(&b)?)?;
            let records = compare(&a, &b)?;
            write_csv(&mut comparison_frame(&records, &label_a, &label_b)?, &out)?;
            println!("Wrote {} ({} portfolios)", out.display(), records.len());
        }
        Commands::Run { inputs, out_dir } => {
            let aggregator = inputs.aggregator()?;
            let data = inputs.load(true)?;

            let ff3 = aggregator.run(&data.panel, &data.responses, FactorModel::FamaFrench3)?;
            let carhart = aggregator.run(&data.panel, &data.responses, FactorModel::Carhart)?;
            write_table(&ff3, &out_dir.join("ff3_25_5x5_results.csv"))?;
            write_table(&carhart, &out_dir.join("carhart_25_5x5_results.csv"))?;

            let records = compare(&ff3, &carhart)?;
            let out = out_dir.join("ff3_vs_carhart_comparison.csv");
            let mut frame = comparison_frame(
                &records,
                FactorModel::FamaFrench3.label(),
                FactorModel::Carhart.label(),
            )?;
            write_csv(&mut frame, &out)?;
            println!("Wrote {}", out.display());
            print_summary(&carhart);
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> CliResult<String> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_table(table: &ResultTable, path: &Path) -> CliResult<()> {
    write_csv(&mut table.to_frame()?, path)?;
    tracing::info!(path = %path.display(), model = %table.model, "wrote result table");
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_summary(table: &ResultTable) {
    println!("\n{:<14} {:>10} {:>8} {:>8}", "portfolio", "alpha", "alpha_t", "r2");
    for r in table.results.iter().take(5) {
        println!(
            "{:<14} {:>10.6} {:>8.2} {:>8.4}",
            r.portfolio.as_str(),
            r.alpha.estimate,
            r.alpha.t_stat,
            r.r2
        );
    }
    if table.len() > 5 {
        println!("... ({} portfolios)", table.len());
    }
}
