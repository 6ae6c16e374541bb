#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/famafrench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod french;
pub use french::{Units, load_factors, load_portfolios, parse_french_table, read_french_file};

mod units;
pub use units::{UnitCheck, UnitReport, UnitViolation};

mod merge;
pub use merge::{merge_panels, panel_dates, require_columns, value_columns};

mod io;
pub use io::{read_csv, write_csv};

mod error;
pub use error::PanelError;
