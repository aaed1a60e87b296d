pub mod error;
pub mod flex_id;
pub mod flexible_time;
pub mod webhook;

pub use error::{Error, FormatError, Result, TimestampParseError};
pub use flex_id::FlexId;
pub use flexible_time::{
    FlexibleTime, TimestampLayout, format_flexible_timestamp, parse_flexible_timestamp,
};
pub use webhook::{Awardable, EmojiEvent, SchemaRevision, decode_event, encode_event, summarize};
