#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/famafrench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod portfolio;
pub use portfolio::PortfolioId;

mod factor;
pub use factor::{Factor, FactorModel, ParseFactorModelError, RISK_FREE_COLUMN};

mod result;
pub use result::{Coefficient, ComparisonRecord, RegressionResult};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;

/// Name of the date key column shared by every panel.
pub const DATE_COLUMN: &str = "date";
