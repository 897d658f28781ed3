//! Inflight markers
//!
//! A marker is a random token written onto every record of one multi-record
//! creation. It is cleared once all records are confirmed, so a record still
//! carrying one belongs to a creation that never finished.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a generated marker.
pub const MARKER_LENGTH: usize = 24;

/// Generate a fresh marker.
///
/// # Examples
///
/// ```
/// use platform_billing::marker::{new_marker, MARKER_LENGTH};
///
/// let marker = new_marker();
/// assert_eq!(marker.len(), MARKER_LENGTH);
/// assert_ne!(marker, new_marker());
/// ```
pub fn new_marker() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MARKER_LENGTH)
        .map(char::from)
        .collect()
}

/// Check if `marker` is the cleared value.
pub fn is_cleared(marker: &str) -> bool {
    marker.is_empty()
}
