//! Reversible obfuscation of internal integer identifiers
//!
//! Every encoded token packs the identifier together with wall-clock
//! components, so encoding the same id twice yields different strings. Only
//! `decode(encode(n)) == n` holds.
//!
//! Payload layout (fixed, shared by encoder and decoder):
//!
//! | index | value             |
//! |-------|-------------------|
//! | 0     | second            |
//! | 1     | **identifier**    |
//! | 2     | minute            |
//! | 3     | month             |
//! | 4     | day of month      |
//! | 5     | microsecond       |

use chrono::{Datelike, Timelike, Utc};
use sqids::Sqids;

use crate::error::IdError;

const PAYLOAD_LEN: usize = 6;
const ID_POSITION: usize = 1;

/// Encodes and decodes opaque identifiers with a configured alphabet
#[derive(Debug, Clone)]
pub struct IdObfuscator {
    sqids: Sqids,
}

impl IdObfuscator {
    /// Build an obfuscator from the configured alphabet and minimum length
    pub fn new(alphabet: &str, min_length: u8) -> Result<Self, IdError> {
        let sqids = Sqids::builder()
            .alphabet(alphabet.chars().collect())
            .min_length(min_length)
            .build()
            .map_err(|e| IdError::Configuration(e.to_string()))?;

        Ok(Self { sqids })
    }

    /// Encode an identifier into an opaque token
    pub fn encode(&self, id: u64) -> Result<String, IdError> {
        let now = Utc::now();
        let mut payload = [0u64; PAYLOAD_LEN];
        payload[0] = u64::from(now.second());
        payload[ID_POSITION] = id;
        payload[2] = u64::from(now.minute());
        payload[3] = u64::from(now.month());
        payload[4] = u64::from(now.day());
        payload[5] = u64::from(now.timestamp_subsec_micros());

        self.sqids
            .encode(&payload)
            .map_err(|e| IdError::Encode(e.to_string()))
    }

    /// Encode a signed database id; negative ids cannot be represented
    pub fn encode_i64(&self, id: i64) -> Result<String, IdError> {
        let id = u64::try_from(id).map_err(|_| IdError::Encode(format!("negative id {}", id)))?;
        self.encode(id)
    }

    /// Recover the identifier from a token produced by [`Self::encode`]
    pub fn decode(&self, token: &str) -> Result<u64, IdError> {
        if token.is_empty() {
            return Err(IdError::Decode);
        }

        let payload = self.sqids.decode(token);
        if payload.len() != PAYLOAD_LEN {
            return Err(IdError::Decode);
        }

        // Tokens from another alphabet or minimum length do not re-encode to themselves.
        match self.sqids.encode(&payload) {
            Ok(canonical) if canonical == token => Ok(payload[ID_POSITION]),
            _ => Err(IdError::Decode),
        }
    }

    /// Decode into the signed representation used by the database
    pub fn decode_i64(&self, token: &str) -> Result<i64, IdError> {
        i64::try_from(self.decode(token)?).map_err(|_| IdError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &str = "k3G7QAe51FCsPW92uEOyq4Bg6Sp8YzVTmnU0liwDdHXLajZrfxNhobJIRcMvKt";

    fn obfuscator() -> IdObfuscator {
        IdObfuscator::new(ALPHABET, 10).unwrap()
    }

    #[test]
    fn test_round_trip_small_and_large_ids() {
        let ids = obfuscator();
        for n in [0u64, 1, 7, 42, 1_000, 65_535, 9_007_199_254_740_991] {
            let token = ids.encode(n).unwrap();
            assert_eq!(ids.decode(&token).unwrap(), n, "token {}", token);
        }
    }

    #[test]
    fn test_repeated_encodes_all_decode_to_same_id() {
        let ids = obfuscator();
        for _ in 0..50 {
            let token = ids.encode(1234).unwrap();
            assert_eq!(ids.decode(&token).unwrap(), 1234);
        }
    }

    #[test]
    fn test_min_length_is_respected() {
        let ids = IdObfuscator::new(ALPHABET, 24).unwrap();
        let token = ids.encode(5).unwrap();
        assert!(token.len() >= 24);
    }

    #[test]
    fn test_rejects_garbage() {
        let ids = obfuscator();
        assert_eq!(ids.decode(""), Err(IdError::Decode));
        assert_eq!(ids.decode("!!!!"), Err(IdError::Decode));
    }

    #[test]
    fn test_rejects_token_with_wrong_arity() {
        let ids = obfuscator();
        let raw = Sqids::builder()
            .alphabet(ALPHABET.chars().collect())
            .min_length(10)
            .build()
            .unwrap();
        let token = raw.encode(&[1, 2, 3]).unwrap();
        assert_eq!(ids.decode(&token), Err(IdError::Decode));
    }

    #[test]
    fn test_rejects_token_from_other_alphabet() {
        let other = IdObfuscator::new("abcdefghijklmnopqrstuvwxyz", 10).unwrap();
        let token = other.encode(99).unwrap();
        let ids = IdObfuscator::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 10).unwrap();
        assert_eq!(ids.decode(&token), Err(IdError::Decode));
    }

    #[test]
    fn test_invalid_alphabet_is_rejected() {
        assert!(matches!(
            IdObfuscator::new("ab", 10),
            Err(IdError::Configuration(_))
        ));
    }

    #[test]
    fn test_signed_helpers() {
        let ids = obfuscator();
        let token = ids.encode_i64(17).unwrap();
        assert_eq!(ids.decode_i64(&token).unwrap(), 17);
        assert!(ids.encode_i64(-1).is_err());
    }
}
