#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/famafrench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod linalg;
pub use linalg::{OlsFit, invert_symmetric, ordinary_least_squares};

mod newey_west;
pub use newey_west::{NeweyWest, classical_covariance, standard_errors};

mod error;
pub use error::MathError;
