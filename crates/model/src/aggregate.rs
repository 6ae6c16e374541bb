//! Per-portfolio regression runs and the result table.

use std::collections::HashSet;

use famafrench_panel::{UnitCheck, merge_panels, value_columns};
use famafrench_primitives::{Coefficient, Factor, FactorModel, PortfolioId, RegressionResult};
use famafrench_traits::{EstimatorError, PanelEstimator, TimeSeriesEstimator};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    DesignMatrixBuilder, EngineConfig, ModelError, RegressionEngine,
    design::{column_array, is_reserved},
};

const PORTFOLIO_COLUMN: &str = "portfolio";
const N_COLUMN: &str = "n";
const ALPHA_COLUMN: &str = "alpha";
const ALPHA_T_COLUMN: &str = "alpha_t";
const R2_COLUMN: &str = "r2";

/// Configuration for the results aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Engine settings shared by every regression.
    pub engine: EngineConfig,
    /// Run the per-portfolio regressions on the rayon pool.
    pub parallel: bool,
    /// Decimal-unit bound applied to the estimation panel before any fit.
    pub units: UnitCheck,
}

/// Regression results for every portfolio of a panel under one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    /// Model the results were estimated with.
    pub model: FactorModel,
    /// One result per portfolio, sorted by portfolio id.
    pub results: Vec<RegressionResult>,
}

impl ResultTable {
    /// Number of portfolios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if the table holds no result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a given portfolio.
    #[must_use]
    pub fn get(&self, portfolio: &str) -> Option<&RegressionResult> {
        self.results.iter().find(|r| r.portfolio.as_str() == portfolio)
    }

    /// Convert to a frame with columns
    /// `portfolio, n, alpha, alpha_t, beta_<f>, beta_<f>_t ..., r2`.
    ///
    /// # Errors
    /// Returns an error if a result lacks a loading of the table's model.
    pub fn to_frame(&self) -> Result<DataFrame, ModelError> {
        let rows = &self.results;
        let mut columns = vec![
            Column::new(
                PORTFOLIO_COLUMN.into(),
                rows.iter().map(|r| r.portfolio.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(N_COLUMN.into(), rows.iter().map(|r| r.n as u64).collect::<Vec<_>>()),
            Column::new(ALPHA_COLUMN.into(), rows.iter().map(|r| r.alpha.estimate).collect::<Vec<_>>()),
            Column::new(ALPHA_T_COLUMN.into(), rows.iter().map(|r| r.alpha.t_stat).collect::<Vec<_>>()),
        ];

        for factor in self.model.factors() {
            let betas = rows
                .iter()
                .map(|r| {
                    r.beta(*factor).copied().ok_or_else(|| ModelError::InvalidColumn {
                        column: factor.beta_column(),
                        reason: format!("no {factor} loading for portfolio {}", r.portfolio),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(Column::new(
                factor.beta_column().into(),
                betas.iter().map(|c| c.estimate).collect::<Vec<_>>(),
            ));
            columns.push(Column::new(
                factor.beta_t_column().into(),
                betas.iter().map(|c| c.t_stat).collect::<Vec<_>>(),
            ));
        }

        columns.push(Column::new(R2_COLUMN.into(), rows.iter().map(|r| r.r2).collect::<Vec<_>>()));
        Ok(DataFrame::new(columns)?)
    }

    /// Rebuild a table from a frame written by [`ResultTable::to_frame`].
    ///
    /// The model is Carhart if a momentum loading column is present and
    /// FF3 otherwise. Standard errors are recovered from estimate and
    /// t-statistic.
    ///
    /// # Errors
    /// Returns an error if a required column is missing or malformed.
    pub fn from_frame(df: &DataFrame) -> Result<Self, ModelError> {
        let model = if df.column(&Factor::Momentum.beta_column()).is_ok() {
            FactorModel::Carhart
        } else {
            FactorModel::FamaFrench3
        };

        let portfolios = df
            .column(PORTFOLIO_COLUMN)
            .map_err(|_| ModelError::MissingColumn(PORTFOLIO_COLUMN.to_string()))?
            .str()
            .map_err(|e| ModelError::InvalidColumn {
                column: PORTFOLIO_COLUMN.to_string(),
                reason: e.to_string(),
            })?
            .into_iter()
            .map(|p| {
                p.map(PortfolioId::from).ok_or_else(|| ModelError::InvalidColumn {
                    column: PORTFOLIO_COLUMN.to_string(),
                    reason: "null portfolio id".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = df
            .column(N_COLUMN)
            .map_err(|_| ModelError::MissingColumn(N_COLUMN.to_string()))?
            .strict_cast(&DataType::UInt64)
            .map_err(|e| ModelError::InvalidColumn {
                column: N_COLUMN.to_string(),
                reason: e.to_string(),
            })?;
        let n = n
            .u64()?
            .into_iter()
            .map(|v| {
                v.map(|v| v as usize).ok_or_else(|| ModelError::InvalidColumn {
                    column: N_COLUMN.to_string(),
                    reason: "null observation count".to_string(),
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let alpha = column_array(df, ALPHA_COLUMN)?;
        let alpha_t = column_array(df, ALPHA_T_COLUMN)?;
        let r2 = column_array(df, R2_COLUMN)?;
        let betas = model
            .factors()
            .iter()
            .map(|f| {
                Ok((*f, column_array(df, &f.beta_column())?, column_array(df, &f.beta_t_column())?))
            })
            .collect::<Result<Vec<(_, Array1<f64>, Array1<f64>)>, ModelError>>()?;

        let mut results: Vec<RegressionResult> = portfolios
            .into_iter()
            .enumerate()
            .map(|(i, portfolio)| RegressionResult {
                portfolio,
                n: n[i],
                alpha: Coefficient::from_t_stat(alpha[i], alpha_t[i]),
                betas: betas
                    .iter()
                    .map(|(f, est, t)| (*f, Coefficient::from_t_stat(est[i], t[i])))
                    .collect(),
                r2: r2[i],
            })
            .collect();
        results.sort_by(|a, b| a.portfolio.cmp(&b.portfolio));

        Ok(Self { model, results })
    }
}

/// Runs the regression engine for every portfolio of a panel.
///
/// Any single failure aborts the whole run; there are no partial tables.
#[derive(Debug, Clone, Default)]
pub struct ResultsAggregator {
    config: AggregatorConfig,
    engine: RegressionEngine,
}

impl ResultsAggregator {
    /// Create a new aggregator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    /// Create a new aggregator with custom configuration.
    #[must_use]
    pub fn with_config(config: AggregatorConfig) -> Self {
        Self { config, engine: RegressionEngine::with_config(config.engine) }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Regress each response column of a merged estimation panel.
    ///
    /// The panel is checked against the configured decimal-unit bound, then
    /// every response and the design matrix are extracted and validated
    /// before the first regression runs.
    ///
    /// # Errors
    /// Returns an error if the panel lacks a column, a response names a
    /// factor column or repeats, a strict unit check fails, or any
    /// regression fails.
    pub fn run(
        &self,
        panel: &DataFrame,
        responses: &[String],
        model: FactorModel,
    ) -> Result<ResultTable, ModelError> {
        if responses.is_empty() {
            return Err(ModelError::NoResponses);
        }
        let mut seen = HashSet::with_capacity(responses.len());
        if let Some(dup) = responses.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ModelError::DuplicatePortfolio(PortfolioId::new(dup.as_str())));
        }
        self.config.units.check(panel)?;

        let design = DesignMatrixBuilder::new(model).build(panel)?;
        let inputs = responses
            .iter()
            .map(|name| {
                if is_reserved(name) {
                    return Err(ModelError::InvalidColumn {
                        column: name.clone(),
                        reason: "factor columns cannot be regressed".to_string(),
                    });
                }
                Ok((PortfolioId::new(name.as_str()), design.excess(&column_array(panel, name)?)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fit = |(portfolio, excess): &(PortfolioId, Array1<f64>)| {
            self.engine
                .regress(portfolio.clone(), excess, design.factors(), model)
                .map_err(|e| ModelError::for_portfolio(portfolio, e))
        };

        let mut results = if self.config.parallel {
            inputs.par_iter().map(fit).collect::<Result<Vec<_>, _>>()?
        } else {
            inputs.iter().map(fit).collect::<Result<Vec<_>, _>>()?
        };
        results.sort_by(|a, b| a.portfolio.cmp(&b.portfolio));

        tracing::info!(
            model = %model,
            portfolios = results.len(),
            months = design.n_obs(),
            max_lags = self.config.engine.max_lags,
            parallel = self.config.parallel,
            "estimated factor model"
        );
        Ok(ResultTable { model, results })
    }

    /// Merge a return panel with a factor panel and regress every return
    /// column of the former. The merged panel goes through the same unit
    /// check as [`ResultsAggregator::run`].
    ///
    /// # Errors
    /// Returns an error if the panels cannot be merged or any regression
    /// fails.
    pub fn run_panels(
        &self,
        returns: &DataFrame,
        factors: &DataFrame,
        model: FactorModel,
    ) -> Result<ResultTable, ModelError> {
        let panel = merge_panels(returns, factors)?;
        self.run(&panel, &value_columns(returns), model)
    }
}

impl PanelEstimator for ResultsAggregator {
    fn estimate(
        &self,
        panel: &DataFrame,
        responses: &[String],
        model: FactorModel,
    ) -> Result<Vec<RegressionResult>, EstimatorError> {
        Ok(self.run(panel, responses, model)?.results)
    }

    fn max_lags(&self) -> usize {
        self.config.engine.max_lags
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use famafrench_math::MathError;
    use famafrench_panel::PanelError;
    use famafrench_primitives::{DATE_COLUMN, Date};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    const MONTHS: usize = 48;

    fn dates(n: usize) -> Vec<Date> {
        (0..n)
            .map(|i| Date::from_ymd_opt(2000 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap())
            .collect()
    }

    /// Two portfolios with alpha 0.002 and market beta 1.0, no noise.
    fn synthetic_panel() -> DataFrame {
        let mut rng = StdRng::seed_from_u64(42);
        let mut draw = |n: usize| (0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05).collect::<Vec<_>>();

        let mkt = draw(MONTHS);
        let smb = draw(MONTHS);
        let hml = draw(MONTHS);
        let rf: Vec<f64> = (0..MONTHS).map(|i| 0.001 + 0.0001 * (i % 5) as f64).collect();

        let p1: Vec<f64> =
            (0..MONTHS).map(|i| rf[i] + 0.002 + mkt[i] + 0.3 * smb[i] - 0.2 * hml[i]).collect();
        let p2: Vec<f64> = (0..MONTHS).map(|i| rf[i] + 0.002 + mkt[i] + 0.8 * hml[i]).collect();

        DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), dates(MONTHS)),
            Column::new("P2".into(), p2),
            Column::new("P1".into(), p1),
            Column::new("Mkt-RF".into(), mkt),
            Column::new("SMB".into(), smb),
            Column::new("HML".into(), hml),
            Column::new("RF".into(), rf),
        ])
        .unwrap()
    }

    fn responses(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recovers_synthetic_panel() {
        let table = ResultsAggregator::new()
            .run(&synthetic_panel(), &responses(&["P1", "P2"]), FactorModel::FamaFrench3)
            .unwrap();

        assert_eq!(table.len(), 2);
        for result in &table.results {
            assert_eq!(result.n, MONTHS);
            assert_relative_eq!(result.alpha.estimate, 0.002, epsilon = 1e-9);
            assert_relative_eq!(
                result.beta(Factor::MarketExcess).unwrap().estimate,
                1.0,
                epsilon = 1e-9
            );
            assert_relative_eq!(result.r2, 1.0, epsilon = 1e-9);
        }
        assert_relative_eq!(
            table.get("P2").unwrap().beta(Factor::Value).unwrap().estimate,
            0.8,
            epsilon = 1e-9
        );
    }

    #[test]
    fn output_is_sorted_and_order_invariant() {
        let panel = synthetic_panel();
        let aggregator = ResultsAggregator::new();

        let forward =
            aggregator.run(&panel, &responses(&["P1", "P2"]), FactorModel::FamaFrench3).unwrap();
        let reverse =
            aggregator.run(&panel, &responses(&["P2", "P1"]), FactorModel::FamaFrench3).unwrap();

        assert_eq!(forward, reverse);
        let ids: Vec<&str> = forward.results.iter().map(|r| r.portfolio.as_str()).collect();
        assert_eq!(ids, ["P1", "P2"]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let panel = synthetic_panel();
        let names = responses(&["P2", "P1"]);

        let sequential =
            ResultsAggregator::new().run(&panel, &names, FactorModel::FamaFrench3).unwrap();
        let parallel = ResultsAggregator::with_config(AggregatorConfig {
            parallel: true,
            ..Default::default()
        })
        .run(&panel, &names, FactorModel::FamaFrench3)
        .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn one_failure_fails_the_run() {
        let mut panel = synthetic_panel();
        panel.with_column(Column::new("P3".into(), vec![f64::NAN; MONTHS])).unwrap();

        let err = ResultsAggregator::new()
            .run(&panel, &responses(&["P1", "P2", "P3"]), FactorModel::FamaFrench3)
            .unwrap_err();

        match err {
            ModelError::Portfolio { portfolio, source } => {
                assert_eq!(portfolio.as_str(), "P3");
                assert!(matches!(
                    *source,
                    ModelError::Estimator(EstimatorError::Math(MathError::NonFinite(_)))
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn collinear_factors_are_singular() {
        let mut panel = synthetic_panel();
        let mkt: Vec<f64> =
            panel.column("Mkt-RF").unwrap().f64().unwrap().into_no_null_iter().collect();
        panel.with_column(Column::new("HML".into(), mkt)).unwrap();

        let err = ResultsAggregator::new()
            .run(&panel, &responses(&["P1"]), FactorModel::FamaFrench3)
            .unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn schema_errors_precede_regressions() {
        let panel = synthetic_panel().drop("RF").unwrap();
        let err = ResultsAggregator::new()
            .run(&panel, &responses(&["P1"]), FactorModel::FamaFrench3)
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(c) if c == "RF"));

        let err = ResultsAggregator::new()
            .run(&synthetic_panel(), &responses(&["P1", "SMB"]), FactorModel::FamaFrench3)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidColumn { column, .. } if column == "SMB"));

        let err = ResultsAggregator::new()
            .run(&synthetic_panel(), &[], FactorModel::FamaFrench3)
            .unwrap_err();
        assert!(err.is_data_availability());
    }

    #[test]
    fn panel_estimator_reports_configuration() {
        let aggregator = ResultsAggregator::with_config(AggregatorConfig {
            engine: EngineConfig { max_lags: 6 },
            ..Default::default()
        });
        assert_eq!(aggregator.max_lags(), 6);

        let results = aggregator
            .estimate(&synthetic_panel(), &responses(&["P1"]), FactorModel::FamaFrench3)
            .unwrap();
        assert_eq!(results.len(), 1);

        let err = aggregator
            .estimate(&synthetic_panel(), &responses(&["P1"]), FactorModel::Carhart)
            .unwrap_err();
        assert!(matches!(err, EstimatorError::MissingColumn(c) if c == "Mom"));
    }

    #[test]
    fn table_frame_layout() {
        let table = ResultsAggregator::new()
            .run(&synthetic_panel(), &responses(&["P1", "P2"]), FactorModel::FamaFrench3)
            .unwrap();
        let df = table.to_frame().unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "portfolio", "n", "alpha", "alpha_t", "beta_mkt", "beta_mkt_t", "beta_smb",
                "beta_smb_t", "beta_hml", "beta_hml_t", "r2"
            ]
        );
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn table_round_trips_through_frame() {
        let table = ResultTable {
            model: FactorModel::Carhart,
            results: vec![RegressionResult {
                portfolio: "SMALL LoBM".into(),
                n: 1170,
                alpha: Coefficient::new(-0.004, 0.001),
                betas: vec![
                    (Factor::MarketExcess, Coefficient::new(1.1, 0.02)),
                    (Factor::Size, Coefficient::new(1.4, 0.04)),
                    (Factor::Value, Coefficient::new(-0.3, 0.05)),
                    (Factor::Momentum, Coefficient::new(-0.1, 0.025)),
                ],
                r2: 0.93,
            }],
        };

        let back = ResultTable::from_frame(&table.to_frame().unwrap()).unwrap();
        assert_eq!(back.model, FactorModel::Carhart);

        let result = &back.results[0];
        assert_eq!(result.portfolio.as_str(), "SMALL LoBM");
        assert_eq!(result.n, 1170);
        assert_relative_eq!(result.alpha.std_error, 0.001, max_relative = 1e-12);
        assert_relative_eq!(
            result.beta(Factor::Momentum).unwrap().t_stat,
            -4.0,
            max_relative = 1e-12
        );
    }

    fn percent_panels() -> (DataFrame, DataFrame) {
        let scaled = synthetic_panel()
            .lazy()
            .with_columns(
                ["P1", "P2", "Mkt-RF", "SMB", "HML", "RF"].map(|c| col(c) * lit(100.0)),
            )
            .collect()
            .unwrap();
        let returns = scaled.select([DATE_COLUMN, "P1", "P2"]).unwrap();
        let factors = scaled.select([DATE_COLUMN, "Mkt-RF", "SMB", "HML", "RF"]).unwrap();
        (returns, factors)
    }

    #[test]
    fn percent_panel_is_flagged() {
        let (returns, factors) = percent_panels();

        // Soft mode warns and still estimates.
        let table =
            ResultsAggregator::new().run_panels(&returns, &factors, FactorModel::FamaFrench3).unwrap();
        assert_eq!(table.len(), 2);

        let strict = ResultsAggregator::with_config(AggregatorConfig {
            units: UnitCheck::new(1.0, true),
            ..Default::default()
        });
        let err = strict.run_panels(&returns, &factors, FactorModel::FamaFrench3).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Panel(PanelError::UnitBound { column, .. }) if column == "P1"
        ));

        // Decimal panels pass the strict check.
        let (returns, factors) = (
            synthetic_panel().select([DATE_COLUMN, "P1", "P2"]).unwrap(),
            synthetic_panel().select([DATE_COLUMN, "Mkt-RF", "SMB", "HML", "RF"]).unwrap(),
        );
        assert!(strict.run_panels(&returns, &factors, FactorModel::FamaFrench3).is_ok());
    }

    #[test]
    fn duplicate_responses_are_rejected() {
        let err = ResultsAggregator::new()
            .run(&synthetic_panel(), &responses(&["P1", "P2", "P1"]), FactorModel::FamaFrench3)
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicatePortfolio(p) if p.as_str() == "P1"));
    }

    #[test]
    fn from_frame_rejects_null_observation_count() {
        let df = DataFrame::new(vec![
            Column::new("portfolio".into(), vec!["P1"]),
            Column::new("n".into(), vec![None::<u64>]),
            Column::new("alpha".into(), vec![0.001]),
            Column::new("alpha_t".into(), vec![2.0]),
            Column::new("beta_mkt".into(), vec![1.0]),
            Column::new("beta_mkt_t".into(), vec![20.0]),
            Column::new("beta_smb".into(), vec![0.2]),
            Column::new("beta_smb_t".into(), vec![3.0]),
            Column::new("beta_hml".into(), vec![-0.1]),
            Column::new("beta_hml_t".into(), vec![-1.5]),
            Column::new("r2".into(), vec![0.9]),
        ])
        .unwrap();

        assert!(matches!(
            ResultTable::from_frame(&df),
            Err(ModelError::InvalidColumn { column, reason })
                if column == "n" && reason == "null observation count"
        ));
    }

    #[test]
    fn from_frame_requires_columns() {
        let df = DataFrame::new(vec![Column::new("portfolio".into(), vec!["P1"])]).unwrap();
        assert!(matches!(ResultTable::from_frame(&df), Err(ModelError::MissingColumn(c)) if c == "n"));
    }
}
