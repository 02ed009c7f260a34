//! Event shape, identity hashing, and signature validation.

use secp256k1::{schnorr, Message, Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::canonical_bytes;

/// The fields that participate in an event's `id` hash, prior to it being
/// assigned an `id` and `sig`.
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

/// A fully formed, wire-shaped Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u64,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl Event {
    fn as_unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: self.pubkey.clone(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }

    /// Returns the tag values for tags whose first element equals `name`,
    /// e.g. `single_letter_tag("e")` yields referenced event ids.
    pub fn tag_values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .filter(move |t| t.first().map(String::as_str) == Some(name))
            .filter_map(|t| t.get(1).map(String::as_str))
    }
}

/// Why an event failed `validate`. Exhaustive per the validator's contract:
/// every decode failure folds into whichever of these kinds that failure
/// belongs to under the corresponding algorithm step, rather than its own
/// "bad encoding" kind.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be {expected_len} hex characters")]
    BadHexLength {
        field: &'static str,
        expected_len: usize,
    },
    #[error("computed id does not match the event's id")]
    IdMismatch,
    #[error("pubkey is not a valid BIP-340 x-only public key")]
    BadPubkey,
    #[error("sig is not a valid 64-byte schnorr signature")]
    BadSignature,
    #[error("signature does not verify against id and pubkey")]
    SigVerifyFailed,
}

fn check_hex_length(field: &'static str, s: &str, expected_len: usize) -> Result<(), ValidationError> {
    if s.len() != expected_len {
        return Err(ValidationError::BadHexLength {
            field,
            expected_len,
        });
    }
    Ok(())
}

/// Validates that `event.id` is the correct hash of its contents and that
/// `event.sig` is a valid BIP-340 Schnorr signature over that id by `pubkey`.
///
/// Does not check application-level acceptability (timestamps, kind
/// whitelists, size limits) — only structural and cryptographic integrity.
pub fn validate(event: &Event) -> Result<(), ValidationError> {
    check_hex_length("id", &event.id, 64)?;
    check_hex_length("pubkey", &event.pubkey, 64)?;
    check_hex_length("sig", &event.sig, 128)?;

    // A non-hex id is itself a mismatch against the computed id (step 1).
    let id_bytes = hex::decode(&event.id).map_err(|_| ValidationError::IdMismatch)?;

    let computed = Sha256::digest(canonical_bytes(&event.as_unsigned()));
    if computed.as_slice() != id_bytes.as_slice() {
        return Err(ValidationError::IdMismatch);
    }

    // A non-hex pubkey is a parse failure against the x-only point (step 2).
    let pubkey_bytes = hex::decode(&event.pubkey).map_err(|_| ValidationError::BadPubkey)?;
    let pubkey =
        XOnlyPublicKey::from_slice(&pubkey_bytes).map_err(|_| ValidationError::BadPubkey)?;

    // A non-hex sig is a parse failure against the signature shape (step 3).
    let sig_bytes = hex::decode(&event.sig).map_err(|_| ValidationError::BadSignature)?;
    let signature =
        schnorr::Signature::from_slice(&sig_bytes).map_err(|_| ValidationError::BadSignature)?;

    let message = Message::from_digest_slice(&id_bytes).map_err(|_| ValidationError::IdMismatch)?;

    let secp = Secp256k1::verification_only();
    secp.verify_schnorr(&signature, &message, &pubkey)
        .map_err(|_| ValidationError::SigVerifyFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_event() -> Event {
        Event {
            id: "70b10f70c1318967eddf12527799411b1a9780ad9c43858f5e5fcd45486a13a5".to_owned(),
            pubkey: "379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe".to_owned(),
            created_at: 1612809991,
            kind: 1,
            tags: vec![],
            content: "test".to_owned(),
            sig: "273a9cd5d11455590f4359500bccb7a89428262b96b3ea87a756b770964472f8c3e87f5d5e64d8d2e859a71462a3f477b554565c4f2f326cb01dd7620db71502".to_owned(),
        }
    }

    #[test]
    fn well_formed_real_event_validates() {
        assert!(validate(&real_event()).is_ok());
    }

    #[test]
    fn tampering_with_content_invalidates_id() {
        let mut e = real_event();
        e.content = "tampered".to_owned();
        assert!(matches!(validate(&e), Err(ValidationError::IdMismatch)));
    }

    #[test]
    fn tampering_with_sig_fails_verification_without_breaking_id() {
        let mut e = real_event();
        // flip a byte in the signature while leaving id intact
        let mut sig = hex::decode(&e.sig).unwrap();
        sig[0] ^= 0xff;
        e.sig = hex::encode(sig);
        assert!(matches!(
            validate(&e),
            Err(ValidationError::SigVerifyFailed) | Err(ValidationError::BadSignature)
        ));
    }

    #[test]
    fn rejects_short_id() {
        let mut e = real_event();
        e.id = "abcd".to_owned();
        assert!(matches!(
            validate(&e),
            Err(ValidationError::BadHexLength { field: "id", .. })
        ));
    }

    #[test]
    fn rejects_non_hex_pubkey() {
        let mut e = real_event();
        e.pubkey = "z".repeat(64);
        assert!(matches!(validate(&e), Err(ValidationError::BadPubkey)));
    }

    #[test]
    fn rejects_non_hex_sig() {
        let mut e = real_event();
        e.sig = "g".repeat(128);
        assert!(matches!(validate(&e), Err(ValidationError::BadSignature)));
    }

    #[test]
    fn non_hex_id_of_correct_length_is_an_id_mismatch() {
        let mut e = real_event();
        e.id = "z".repeat(64);
        assert!(matches!(validate(&e), Err(ValidationError::IdMismatch)));
    }

    #[test]
    fn tag_values_filters_by_name_and_ignores_bare_tags() {
        let mut e = real_event();
        e.tags = vec![
            vec!["e".to_owned(), "abc".to_owned()],
            vec!["p".to_owned(), "def".to_owned()],
            vec!["nonce".to_owned()],
        ];
        let e_tags: Vec<&str> = e.tag_values("e").collect();
        assert_eq!(e_tags, vec!["abc"]);
    }
}
