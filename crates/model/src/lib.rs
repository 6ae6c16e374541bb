#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/famafrench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod design;
pub use design::{Design, DesignMatrixBuilder};

mod regression;
pub use regression::{EngineConfig, RegressionEngine};

mod aggregate;
pub use aggregate::{AggregatorConfig, ResultTable, ResultsAggregator};

mod compare;
pub use compare::{compare, comparison_frame};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use famafrench_primitives::{FactorModel, RegressionResult};
    pub use famafrench_traits::{PanelEstimator, TimeSeriesEstimator};

    pub use super::{
        AggregatorConfig, EngineConfig, ModelError, RegressionEngine, ResultTable,
        ResultsAggregator, compare,
    };
}
