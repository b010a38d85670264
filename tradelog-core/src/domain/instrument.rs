//! Trade classification: direction, asset type, setup grade.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trade direction.
///
/// Anything other than `long` / `short` deserializes to `Unrecognized` so that
/// a malformed stored record can still be loaded; the metrics engine rejects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    #[serde(other)]
    Unrecognized,
}

impl Direction {
    /// +1 for long, -1 for short. `None` for an unrecognized direction.
    pub fn sign(self) -> Option<f64> {
        match self {
            Direction::Long => Some(1.0),
            Direction::Short => Some(-1.0),
            Direction::Unrecognized => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
            Direction::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(ClassificationError::Direction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Forex,
    Crypto,
    Stock,
    Cfd,
    Futures,
    Indices,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Forex,
        AssetType::Crypto,
        AssetType::Stock,
        AssetType::Cfd,
        AssetType::Futures,
        AssetType::Indices,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Forex => "forex",
            AssetType::Crypto => "crypto",
            AssetType::Stock => "stock",
            AssetType::Cfd => "cfd",
            AssetType::Futures => "futures",
            AssetType::Indices => "indices",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AssetType::ALL
            .into_iter()
            .find(|a| a.as_str() == lower)
            .ok_or(ClassificationError::AssetType(lower))
    }
}

/// Setup quality grade assigned by the trader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetupGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl SetupGrade {
    pub fn letter(self) -> &'static str {
        match self {
            SetupGrade::APlus => "A+",
            SetupGrade::A => "A",
            SetupGrade::B => "B",
            SetupGrade::C => "C",
            SetupGrade::D => "D",
            SetupGrade::F => "F",
        }
    }
}

impl fmt::Display for SetupGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for SetupGrade {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Ok(SetupGrade::APlus),
            "A" => Ok(SetupGrade::A),
            "B" => Ok(SetupGrade::B),
            "C" => Ok(SetupGrade::C),
            "D" => Ok(SetupGrade::D),
            "F" => Ok(SetupGrade::F),
            other => Err(ClassificationError::SetupGrade(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClassificationError {
    #[error("unknown direction '{0}' (expected long or short)")]
    Direction(String),
    #[error("unknown asset type '{0}'")]
    AssetType(String),
    #[error("unknown setup grade '{0}'")]
    SetupGrade(String),
}
