use thiserror::Error;

/// Failure to turn webhook timestamp text into an instant.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid time value: {0}")]
    InvalidTimeValue(String),

    #[error("unable to parse time {text:?}: {source}")]
    Unparseable {
        text: String,
        #[source]
        source: TimestampParseError,
    },
}

/// Why a single candidate layout rejected the input.
#[derive(Debug, Error, PartialEq)]
pub enum TimestampParseError {
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),

    #[error("expected {0}")]
    Malformed(&'static str),

    #[error("missing time zone abbreviation")]
    MissingZone,

    #[error("unknown time zone abbreviation {0:?}")]
    UnknownZone(String),

    #[error("time is out of range")]
    OutOfRange,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode emoji event: {0}")]
    Decode(serde_json::Error),

    #[error("failed to encode emoji event: {0}")]
    Encode(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
