//! Key encoding for counter buckets.
//!
//! - [`geo_key`] - dimension tuple stored as a field inside geo buckets
//! - [`time_bucket`] - UTC-minute token used by timestamped buckets
//! - [`bucket`] - bucket key wire formats

pub mod bucket;
pub mod geo_key;
pub mod time_bucket;

pub use bucket::{ActivityKey, BucketKey};
pub use geo_key::{DimensionTuple, UNKNOWN, decode_geo_key, encode_geo_key};
pub use time_bucket::{
    bucket_time_token, check_bucket_time, parse_bucket_time_token, truncate_to_minute,
};

use crate::error::{Result, TallyError};

/// Longest client or entity id accepted anywhere in a key.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Client and entity ids end up as bare key segments, so they are restricted
/// to characters that never collide with the `:` delimiter.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(TallyError::validation(field, "must not be empty", Some(value)));
    }

    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(TallyError::validation(
            field,
            format!("longer than {MAX_IDENTIFIER_LEN} characters"),
            Some(value),
        ));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid || value == UNKNOWN {
        return Err(TallyError::validation(
            field,
            "contains unsupported characters",
            Some(value),
        ));
    }

    Ok(())
}
