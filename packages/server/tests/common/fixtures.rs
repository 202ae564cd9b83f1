//! Request fixtures: payloads and broker-style signatures.

use chrono::Utc;
use pipeline_core::domains::ingestion::testing::{sign_token, test_claims};
use pipeline_core::domains::ingestion::VerifiedClaims;
use serde_json::json;

pub use pipeline_core::domains::ingestion::testing::{sign_body, OTHER_PRIVATE_KEY_PEM};

/// A job payload as the broker delivers it.
pub fn job_payload(id: &str, url: &str) -> Vec<u8> {
    json!({
        "id": id,
        "url": url,
        "ts": Utc::now().to_rfc3339(),
    })
    .to_string()
    .into_bytes()
}

/// Signature that expired ten minutes ago, well past the validation leeway.
pub fn expired_signature(body: &[u8]) -> String {
    let now = Utc::now().timestamp();
    sign_token(&VerifiedClaims {
        exp: Some(now - 600),
        iat: Some(now - 1200),
        nbf: Some(now - 1200),
        ..test_claims(Some(body))
    })
}

/// Signature that only becomes valid in ten minutes.
pub fn future_signature(body: &[u8]) -> String {
    let now = Utc::now().timestamp();
    sign_token(&VerifiedClaims {
        nbf: Some(now + 600),
        exp: Some(now + 900),
        ..test_claims(Some(body))
    })
}

/// Signature over claims without a body hash.
pub fn unbound_signature() -> String {
    sign_token(&test_claims(None))
}

/// Signature made with a key the server does not trust.
pub fn foreign_signature(body: &[u8]) -> String {
    let key = jsonwebtoken::EncodingKey::from_ed_pem(OTHER_PRIVATE_KEY_PEM.as_bytes())
        .expect("other private key is valid PEM");
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::EdDSA),
        &test_claims(Some(body)),
        &key,
    )
    .expect("signing with other key")
}
