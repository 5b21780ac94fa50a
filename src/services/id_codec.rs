/*
 * Responsibility
 * - store 内部の連番 ID ↔ 公開 `_id` 文字列の変換 (encode/decode)
 * - 方式 (sqids) をここに閉じ込め、store 実装からはこの service を使う
 *
 * thiserror を使わない理由:
 * - このモジュール内で完結するエラー型なので
 */
use sqids::{Error as SqidsError, Sqids};
use std::{error::Error, fmt};

pub type Result<T> = std::result::Result<T, IdCodecError>;

pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_MIN_LENGTH: usize = 10;

#[derive(Debug)]
pub enum IdCodecError {
    InvalidMinLength { value: usize },
    Sqids(SqidsError),
    NegativeId { value: i64 },
}

impl fmt::Display for IdCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdCodecError::InvalidMinLength { value } => {
                write!(
                    f,
                    "SQIDS_MIN_LENGTH must be between 0 and 255, got {}",
                    value
                )
            }
            IdCodecError::Sqids(e) => write!(f, "Sqids error: {}", e),
            IdCodecError::NegativeId { value } => {
                write!(f, "id must be non-negative, got {}", value)
            }
        }
    }
}

impl Error for IdCodecError {}

impl From<SqidsError> for IdCodecError {
    fn from(e: SqidsError) -> Self {
        IdCodecError::Sqids(e)
    }
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self> {
        let min_length: u8 = min_length
            .try_into()
            .map_err(|_| IdCodecError::InvalidMinLength { value: min_length })?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()?;

        Ok(Self { sqids })
    }

    pub fn encode(&self, id: i64) -> Result<String> {
        if id < 0 {
            return Err(IdCodecError::NegativeId { value: id });
        }
        Ok(self.sqids.encode(&[id as u64])?)
    }

    /// Returns the internal id for a public `_id`, or `None` when it names no record.
    ///
    /// Several strings can decode to the same number; only the canonical encoding is
    /// accepted so each record has exactly one public id.
    pub fn decode(&self, public_id: &str) -> Option<i64> {
        let nums = self.sqids.decode(public_id);
        let [n] = nums.as_slice() else {
            return None;
        };
        let id = i64::try_from(*n).ok()?;

        match self.encode(id) {
            Ok(canonical) if canonical == public_id => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new(DEFAULT_MIN_LENGTH, DEFAULT_ALPHABET).unwrap()
    }

    #[test]
    fn encoded_ids_have_the_configured_min_length() {
        let public_id = codec().encode(1).unwrap();
        assert!(public_id.len() >= DEFAULT_MIN_LENGTH);
        assert_eq!(codec().decode(&public_id), Some(1));
    }

    #[test]
    fn garbage_and_non_canonical_ids_decode_to_none() {
        let codec = codec();
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("not-an-id!"), None);

        let public_id = codec.encode(42).unwrap();
        let mut tampered = public_id.clone();
        tampered.push('a');
        assert_ne!(codec.decode(&tampered), Some(42));
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(matches!(
            IdCodec::new(300, DEFAULT_ALPHABET),
            Err(IdCodecError::InvalidMinLength { value: 300 })
        ));
        assert!(matches!(codec().encode(-1), Err(IdCodecError::NegativeId { .. })));
    }
}
