//! ID generation utilities for Vigil
//!
//! Session identifiers only; stimulus ids are sequential per session.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique session ID
///
/// Format: `ses-{timestamp_ms}-{random_hex}`
/// Example: `ses-1738300800123-a1b2`
pub fn generate_session_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("ses-{}-{:04x}", timestamp, random)
}
