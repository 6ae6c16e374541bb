//! Factor and factor-model definitions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Column holding the one-month risk-free rate.
pub const RISK_FREE_COLUMN: &str = "RF";

/// A systematic risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Market excess return (`Mkt-RF`).
    MarketExcess,
    /// Small minus big (`SMB`).
    Size,
    /// High minus low book-to-market (`HML`).
    Value,
    /// Up minus down prior returns (`Mom`).
    Momentum,
}

impl Factor {
    /// Every factor known to the workspace.
    pub const ALL: [Self; 4] = [Self::MarketExcess, Self::Size, Self::Value, Self::Momentum];

    /// Column name in the Ken French factor files.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::MarketExcess => "Mkt-RF",
            Self::Size => "SMB",
            Self::Value => "HML",
            Self::Momentum => "Mom",
        }
    }

    /// Short key used in result column names (`beta_<key>`).
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::MarketExcess => "mkt",
            Self::Size => "smb",
            Self::Value => "hml",
            Self::Momentum => "mom",
        }
    }

    /// Name of the coefficient column in a result table.
    #[must_use]
    pub fn beta_column(&self) -> String {
        format!("beta_{}", self.key())
    }

    /// Name of the t-statistic column in a result table.
    #[must_use]
    pub fn beta_t_column(&self) -> String {
        format!("beta_{}_t", self.key())
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The asset-pricing model whose factors enter the regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorModel {
    /// Fama-French three-factor model.
    #[default]
    #[serde(rename = "ff3")]
    FamaFrench3,
    /// Carhart four-factor model (FF3 plus momentum).
    Carhart,
}

impl FactorModel {
    /// Factors of the model, in design-matrix order.
    #[must_use]
    pub const fn factors(&self) -> &'static [Factor] {
        match self {
            Self::FamaFrench3 => &[Factor::MarketExcess, Factor::Size, Factor::Value],
            Self::Carhart => {
                &[Factor::MarketExcess, Factor::Size, Factor::Value, Factor::Momentum]
            }
        }
    }

    /// Short label used in file names and comparison columns.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FamaFrench3 => "ff3",
            Self::Carhart => "carhart",
        }
    }
}

impl fmt::Display for FactorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a model label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFactorModelError(String);

impl fmt::Display for ParseFactorModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown factor model `{}` (expected `ff3` or `carhart`)", self.0)
    }
}

impl std::error::Error for ParseFactorModelError {}

impl FromStr for FactorModel {
    type Err = ParseFactorModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ff3" | "fama-french" | "famafrench3" => Ok(Self::FamaFrench3),
            "carhart" | "ff4" => Ok(Self::Carhart),
            other => Err(ParseFactorModelError(other.to_string())),
        }
    }
}
