use sqids::Sqids;

use crate::config::SqidsConfig;

/// Raised for any opaque id string that did not come out of [`IdCodec::encode`].
/// Callers fold this into a 404 outcome; it never becomes a server error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdCodecError {
    #[error("not a valid id")]
    Invalid,
    #[error("id out of range")]
    OutOfRange,
}

/// Reversible mapping between internal integer row ids and the opaque
/// alphanumeric strings exposed to clients. One instance is built from config
/// at startup and shared through `AppState`; every boundary crossing goes
/// through it exactly once per direction.
#[derive(Clone)]
pub struct IdCodec {
    sqids: Sqids,
    alphabet: Vec<char>,
}

impl IdCodec {
    pub fn new(config: &SqidsConfig) -> anyhow::Result<Self> {
        let alphabet: Vec<char> = config.alphabet.chars().collect();
        let sqids = Sqids::builder()
            .alphabet(alphabet.clone())
            .min_length(config.min_length)
            .build()?;
        Ok(Self { sqids, alphabet })
    }

    pub fn encode(&self, id: i64) -> Result<String, IdCodecError> {
        if id < 0 {
            return Err(IdCodecError::OutOfRange);
        }
        self.sqids
            .encode(&[id as u64])
            .map_err(|_| IdCodecError::OutOfRange)
    }

    pub fn decode(&self, code: &str) -> Result<i64, IdCodecError> {
        if code.is_empty() || !code.chars().all(|c| self.alphabet.contains(&c)) {
            return Err(IdCodecError::Invalid);
        }
        let numbers = self.sqids.decode(code);
        let [id] = numbers.as_slice() else {
            return Err(IdCodecError::Invalid);
        };
        if *id > i64::MAX as u64 {
            return Err(IdCodecError::OutOfRange);
        }
        // Sqids decoding is lenient; only the canonical encoding of a single
        // number is accepted, which keeps the mapping one-to-one.
        if self.encode(*id as i64)? != code {
            return Err(IdCodecError::Invalid);
        }
        Ok(*id as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new(&SqidsConfig {
            alphabet: "k3G7QAe51FCsPW92uEOyq4Bg6Sp8YzVTmnU0liwDdHXLajZrfxNhobJIRcMvKt".into(),
            min_length: 8,
        })
        .expect("codec should build")
    }

    #[test]
    fn roundtrip_over_sample_range() {
        let codec = codec();
        for n in (0..5_000).chain([i64::MAX / 2, 123_456_789]) {
            let code = codec.encode(n).expect("encode");
            assert!(code.len() >= 8);
            assert_eq!(codec.decode(&code), Ok(n), "roundtrip failed for {n}");
        }
    }

    #[test]
    fn distinct_ids_never_collide() {
        let codec = codec();
        let mut seen = std::collections::HashSet::new();
        for n in 0..5_000 {
            assert!(seen.insert(codec.encode(n).expect("encode")));
        }
    }

    #[test]
    fn encode_rejects_negative() {
        assert_eq!(codec().encode(-1), Err(IdCodecError::OutOfRange));
    }

    #[test]
    fn decode_rejects_garbage() {
        let codec = codec();
        for s in ["", " ", "not an id", "@@@@", "abc-def", "ÄÖÜ"] {
            assert!(codec.decode(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn decode_rejects_foreign_alphabet_strings() {
        let codec = codec();
        let other = IdCodec::new(&SqidsConfig {
            alphabet: "abcdefghijklmnopqrstuvwxyz".into(),
            min_length: 8,
        })
        .expect("codec should build");
        let foreign = other.encode(42).expect("encode");
        // Either the characters fall outside our alphabet or the string
        // decodes to something non-canonical; both must fail cleanly.
        assert!(codec.decode(&foreign).is_err());
    }

    #[test]
    fn decode_rejects_non_canonical_strings() {
        let codec = codec();
        let code = codec.encode(7).expect("encode");
        // Append a valid alphabet character so the string stays well-formed
        // but no longer matches the canonical encoding of any single id.
        let tampered = format!("{code}k");
        assert!(codec.decode(&tampered).is_err());
    }
}
