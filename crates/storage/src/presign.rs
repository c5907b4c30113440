//! Expiry rules for signed download URLs.

use crate::StorageError;
use std::time::Duration;

/// Expiry used when the caller does not pick one (10 minutes).
pub const DEFAULT_URL_EXPIRY_SECS: u64 = 600;

/// Longest expiry accepted by V4 signing on both S3 and GCS (7 days).
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Validate a signed URL expiry and convert it to a [`Duration`].
pub fn validate_expiry(expiry_secs: u64) -> Result<Duration, StorageError> {
    if expiry_secs == 0 || expiry_secs > MAX_URL_EXPIRY_SECS {
        return Err(StorageError::InvalidExpiry(expiry_secs));
    }
    Ok(Duration::from_secs(expiry_secs))
}
