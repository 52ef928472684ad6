use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::EngineError;

/// 32 symbols; visually ambiguous I, O, 0 and 1 are excluded.
const CODE_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const CODE_LENGTH: usize = 8;
/// With 32^8 possible codes a collision is already vanishingly unlikely; the
/// cap only guards against a corrupted store making the loop spin forever.
const MAX_ATTEMPTS: usize = 10;

fn random_code() -> String {
    let uuid = Uuid::new_v4();
    uuid.as_bytes()
        .iter()
        .take(CODE_LENGTH)
        .map(|b| CODE_ALPHABET[(b & 0x1f) as usize] as char)
        .collect()
}

/// Generates a booking code that does not collide with any stored booking.
/// The UNIQUE constraint on bookings.booking_code remains the authoritative
/// guard; this loop is the best-effort pre-filter.
pub fn generate_unique_code(conn: &Connection) -> Result<String, EngineError> {
    unique_code_with(random_code, |code| queries::booking_code_exists(conn, code))
}

fn unique_code_with<G, E>(mut generate: G, mut exists: E) -> Result<String, EngineError>
where
    G: FnMut() -> String,
    E: FnMut(&str) -> anyhow::Result<bool>,
{
    for _ in 0..MAX_ATTEMPTS {
        let code = generate();
        if !exists(&code)? {
            return Ok(code);
        }
    }
    Err(EngineError::GenerationExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        for _ in 0..100 {
            let code = random_code();
            assert_eq!(code.len(), CODE_LENGTH);
            for c in code.bytes() {
                assert!(CODE_ALPHABET.contains(&c), "unexpected symbol {}", c as char);
            }
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_symbols() {
        for c in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&c));
        }
    }

    #[test]
    fn test_retries_past_collisions() {
        let candidates = ["TAKEN222", "TAKEN333", "FRESH444"];
        let mut i = 0;
        let code = unique_code_with(
            || {
                let c = candidates[i].to_string();
                i += 1;
                c
            },
            |code| Ok(code.starts_with("TAKEN")),
        )
        .unwrap();
        assert_eq!(code, "FRESH444");
    }

    #[test]
    fn test_exhausts_after_bounded_attempts() {
        let mut attempts = 0;
        let result = unique_code_with(
            || {
                attempts += 1;
                "TAKEN222".to_string()
            },
            |_| Ok(true),
        );
        assert!(matches!(result, Err(EngineError::GenerationExhausted)));
        assert_eq!(attempts, MAX_ATTEMPTS);
    }

    #[test]
    fn test_skips_codes_already_in_store() {
        let conn = crate::db::init_db(":memory:").unwrap();
        // no bookings stored, so the first candidate wins
        let code = generate_unique_code(&conn).unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
    }
}
