//! Opaque pagination cursors.
//!
//! A cursor pins a position in the `(rank_value desc, player_id asc)`
//! ordering: the pair is rendered as `"<rank_value>:<player_id>"` and
//! hex-encoded so clients treat it as an opaque token. Because the pair
//! is a full sort key, a cursor stays valid across refreshes; rows
//! appearing or disappearing around it shift the page contents but never
//! invalidate the token itself.

use super::StorageError;

/// Encode a ladder position into an opaque cursor token.
pub fn encode_cursor(rank_value: i64, player_id: &str) -> String {
    hex::encode(format!("{}:{}", rank_value, player_id))
}

/// Decode an opaque cursor token back into a ladder position.
///
/// Any deviation from the expected shape is [`StorageError::InvalidCursor`];
/// decoding happens before any file is touched, so a garbage token can
/// never cost an I/O round trip.
pub fn decode_cursor(cursor: &str) -> Result<(i64, String), StorageError> {
    let bytes = hex::decode(cursor).map_err(|_| StorageError::InvalidCursor)?;
    let raw = String::from_utf8(bytes).map_err(|_| StorageError::InvalidCursor)?;

    let (value, player_id) = raw.split_once(':').ok_or(StorageError::InvalidCursor)?;
    let rank_value: i64 = value.parse().map_err(|_| StorageError::InvalidCursor)?;

    if player_id.is_empty() {
        return Err(StorageError::InvalidCursor);
    }

    Ok((rank_value, player_id.to_string()))
}
