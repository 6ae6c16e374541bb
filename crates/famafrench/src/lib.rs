//! # famafrench
//!
//! Time-series factor regressions of the 25 size/book-to-market portfolios on
//! the Fama-French three-factor and Carhart four-factor models, with
//! Newey-West standard errors.
//!
//! This crate re-exports the workspace crates behind feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Domain types (factors, models, results)
//! - `traits`: Estimator traits
//! - `math`: OLS and Newey-West covariance
//! - `panel`: Ken French table parsing and panel merging
//! - `model`: Regression engine, aggregator and comparator
//! - `cli`: The `famafrench` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use famafrench::{model::ResultsAggregator, panel, primitives::FactorModel};
//!
//! let returns = panel::load_portfolios(&portfolio_text)?;
//! let factors = panel::load_factors(&ff3_text, Some(&momentum_text))?;
//! let table = ResultsAggregator::new().run_panels(&returns, &factors, FactorModel::Carhart)?;
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/famafrench/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use famafrench_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use famafrench_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use famafrench_math as math;
#[cfg(feature = "panel")]
#[doc(inline)]
pub use famafrench_panel as panel;
#[cfg(feature = "model")]
#[doc(inline)]
pub use famafrench_model as model;
