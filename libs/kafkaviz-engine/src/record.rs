use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::Serialize;

/// A record of a partition log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Unique record id.
    pub id: String,
    /// Opaque payload.
    pub payload: String,
    /// Creation time in Unix milliseconds.
    pub ts_ms: i64,
    /// Partition-relative offset, assigned at append time.
    pub offset: u64,
}

/// Current Unix time in milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base-36 identifier of `len` characters.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Short display label for a payload.
///
/// Generated payloads (`Msg-12`) become `M12`, anything else is cut to
/// its first four characters. Without a payload the offset is shown.
pub fn format_message_label(payload: Option<&str>, offset: Option<u64>) -> String {
    match (payload, offset) {
        (Some(p), _) if p.starts_with("Msg-") => p.replacen("Msg-", "M", 1),
        (Some(p), _) if !p.is_empty() => p.chars().take(4).collect(),
        (_, Some(offset)) => format!("O:{offset}"),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_payloads_are_shortened() {
        assert_eq!(format_message_label(Some("Msg-12"), Some(3)), "M12");
    }

    #[test]
    fn custom_payloads_are_truncated() {
        assert_eq!(format_message_label(Some("payment"), None), "paym");
        assert_eq!(format_message_label(Some("ok"), None), "ok");
    }

    #[test]
    fn offset_fallback() {
        assert_eq!(format_message_label(None, Some(7)), "O:7");
        assert_eq!(format_message_label(Some(""), Some(7)), "O:7");
        assert_eq!(format_message_label(None, None), "?");
    }

    #[test]
    fn random_ids_are_base36() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = random_id(&mut rng, 5);
        assert_eq!(id.len(), 5);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }
}
