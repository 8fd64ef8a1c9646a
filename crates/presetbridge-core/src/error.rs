//! Error types for the conversion engine.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a conversion pass.
///
/// Recoverable problems (a malformed zone, an unsupported opcode) never show up
/// here; they are logged and skipped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "sample file not found: {path} \
         (searched working directory, sample set folder and Samples folder)"
    )]
    SampleNotFound { path: String },

    #[error("sample file no longer exists: {path}")]
    SampleMissing { path: PathBuf },

    #[error("unsupported audio format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid sample boundaries in {path}: {violation}")]
    Boundary {
        path: PathBuf,
        violation: BoundaryViolation,
    },

    #[error("could not create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("audio error in {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("could not decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("SFZ error: {0}")]
    Sfz(#[from] presetbridge_sfz::Error),

    #[error("XML output error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn audio(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        Error::Audio {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: symphonia::core::errors::Error) -> Self {
        Error::Decode {
            path: path.into(),
            source,
        }
    }
}

/// A trim or loop boundary that does not fit the sample file.
///
/// Values are the resolved frame positions after inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryViolation {
    StartOutOfRange { start: i64, length: usize },
    EndOutOfRange { end: i64, length: usize },
    EndBeforeLoopStart { end: i64, loop_start: i64 },
    EndBeforeLoopEnd { end: i64, loop_end: i64 },
    StartAfterCrossfadeStart {
        start: i64,
        loop_start: i64,
        crossfade: i64,
    },
    StartAfterEnd { start: i64, end: i64 },
    CrossfadeLongerThanLoop {
        crossfade: i64,
        loop_start: i64,
        loop_end: i64,
    },
}

impl fmt::Display for BoundaryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BoundaryViolation::StartOutOfRange { start, length } => write!(
                f,
                "start point {} is outside the sample (length {})",
                start, length
            ),
            BoundaryViolation::EndOutOfRange { end, length } => write!(
                f,
                "end point {} is past the end of the sample (length {})",
                end, length
            ),
            BoundaryViolation::EndBeforeLoopStart { end, loop_start } => write!(
                f,
                "end point {} is before the loop start {}",
                end, loop_start
            ),
            BoundaryViolation::EndBeforeLoopEnd { end, loop_end } => write!(
                f,
                "end point {} is before the loop end {}",
                end, loop_end
            ),
            BoundaryViolation::StartAfterCrossfadeStart {
                start,
                loop_start,
                crossfade,
            } => write!(
                f,
                "start point {} is after the crossfade start {} (loop start {} minus crossfade {})",
                start,
                loop_start - crossfade,
                loop_start,
                crossfade
            ),
            BoundaryViolation::StartAfterEnd { start, end } => {
                write!(f, "start point {} is after the end point {}", start, end)
            }
            BoundaryViolation::CrossfadeLongerThanLoop {
                crossfade,
                loop_start,
                loop_end,
            } => write!(
                f,
                "crossfade of {} samples does not fit the loop {}..{}",
                crossfade, loop_start, loop_end
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
