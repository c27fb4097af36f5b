//! Numeric codes used across the feeds.

use std::fmt;
use std::str::FromStr;

/// Track condition attached to lap notes, cautions and pit stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagState {
    Green,
    Yellow,
    Red,
    Checkered,
    White,
    WarmUp,
    NotActive,
}

impl FlagState {
    /// Map a feed code to a flag. Unknown codes have no flag.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(FlagState::Green),
            2 => Some(FlagState::Yellow),
            3 => Some(FlagState::Red),
            4 => Some(FlagState::Checkered),
            5 => Some(FlagState::White),
            8 => Some(FlagState::WarmUp),
            9 => Some(FlagState::NotActive),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlagState::Green => "Green",
            FlagState::Yellow => "Yellow",
            FlagState::Red => "Red",
            FlagState::Checkered => "Checkered",
            FlagState::White => "White",
            FlagState::WarmUp => "Warm Up",
            FlagState::NotActive => "Not Active",
        }
    }
}

/// Flag name for an optional feed code.
pub fn flag_name(code: Option<i64>) -> Option<String> {
    code.and_then(FlagState::from_code).map(|f| f.name().to_string())
}

impl fmt::Display for FlagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// National touring series and their feed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Cup,
    Xfinity,
    Truck,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::Cup, Series::Xfinity, Series::Truck];

    pub fn id(&self) -> i64 {
        match self {
            Series::Cup => 1,
            Series::Xfinity => 2,
            Series::Truck => 3,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Series::Cup => "Cup Series",
            Series::Xfinity => "Xfinity Series",
            Series::Truck => "Truck Series",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Series {
    type Err = String;

    /// Accepts the numeric id or a short name (`cup`, `xfinity`, `truck`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(id) = s.parse::<i64>() {
            return Series::from_id(id).ok_or_else(|| format!("unknown series id: {id}"));
        }
        match s.trim_end_matches(" series") {
            "cup" => Ok(Series::Cup),
            "xfinity" | "busch" => Ok(Series::Xfinity),
            "truck" | "trucks" => Ok(Series::Truck),
            other => Err(format!("unknown series: {other}")),
        }
    }
}
