//! Serialization format negotiation.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Whether this build carries the Parquet codec.
pub(crate) const PARQUET_COMPILED: bool = cfg!(feature = "parquet");

/// On-disk serialization of a cached table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    /// Text-delimited; headers kept, column types re-inferred on load.
    Csv,
    /// Columnar-binary; column types kept exactly. Needs the `parquet` feature.
    Parquet,
}

impl TableFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Whether the codec for this format is compiled in.
    pub fn is_available(&self) -> bool {
        self.available_with(PARQUET_COMPILED)
    }

    fn available_with(&self, parquet_compiled: bool) -> bool {
        match self {
            TableFormat::Csv => true,
            TableFormat::Parquet => parquet_compiled,
        }
    }

    /// Fail with `MissingCodec` when the codec is not compiled in.
    pub fn require_codec(&self) -> Result<(), Error> {
        self.require_codec_with(PARQUET_COMPILED)
    }

    pub(crate) fn require_codec_with(&self, parquet_compiled: bool) -> Result<(), Error> {
        if self.available_with(parquet_compiled) { Ok(()) } else { Err(self.missing_codec()) }
    }

    pub(crate) fn missing_codec(&self) -> Error {
        Error::MissingCodec {
            format: self.as_str(),
            hint: "rebuild pitlane-core with the 'parquet' feature or use the 'csv' format",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "parquet" => Ok(TableFormat::Parquet),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Pick the format for one call: the explicit argument, else the default.
///
/// Returns `Ok(None)` when both are absent or blank.
pub fn resolve_format(explicit: Option<&str>, default: &str) -> Result<Option<TableFormat>, Error> {
    let chosen = explicit.unwrap_or(default).trim();
    if chosen.is_empty() {
        return Ok(None);
    }
    chosen.parse().map(Some)
}
