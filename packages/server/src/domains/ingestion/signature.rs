//! Broker signature verification.
//!
//! Every delivery carries an `Upstash-Signature` header holding a JWT signed
//! by the broker with Ed25519 (`alg: EdDSA`). Nothing in the request body is
//! looked at until that token verifies against the configured public key.
//!
//! Checks, in order:
//! 1. header present (else 401)
//! 2. signing key configured (else 500)
//! 3. signature, algorithm, `exp`/`nbf` when present (else 401)
//! 4. `body` claim, when present, equals base64url(SHA-256(raw body)) (else 401)
//!
//! There is no replay protection: a captured header/body pair verifies again
//! until its `exp` passes.

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use qstash_client::SIGNATURE_HEADER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::error::WebhookError;

/// The broker's public verification key.
#[derive(Clone)]
pub struct SigningKey {
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(Ed25519)")
    }
}

impl SigningKey {
    /// Parse a key from configuration.
    ///
    /// Accepts a PEM `PUBLIC KEY` block or the raw 32-byte key as base64url
    /// (the `x` member of an OKP JWK).
    pub fn from_config(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.contains("-----BEGIN") {
            // .env files often carry PEM blocks with literal "\n"
            let pem = raw.replace("\\n", "\n");
            let decoding_key = DecodingKey::from_ed_pem(pem.as_bytes())
                .context("signing key is not a valid Ed25519 PEM public key")?;
            return Ok(Self { decoding_key });
        }

        let x = raw.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(x)
            .context("signing key is neither PEM nor base64url")?;
        if bytes.len() != 32 {
            anyhow::bail!(
                "signing key must be 32 bytes for Ed25519, got {}",
                bytes.len()
            );
        }
        let decoding_key =
            DecodingKey::from_ed_components(x).context("invalid Ed25519 key components")?;
        Ok(Self { decoding_key })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::EdDSA);
        // exp/nbf are checked when present but not required
        validation.required_spec_claims = HashSet::new();
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation
    }
}

/// Claim set carried by a verified signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Destination URL the broker delivered to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// base64url SHA-256 of the request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// One inbound webhook call, before verification.
#[derive(Debug)]
pub struct WebhookEnvelope {
    signature: String,
    raw_body: Bytes,
    received_at: DateTime<Utc>,
}

impl WebhookEnvelope {
    /// Capture the signature header and the untouched body.
    pub fn from_parts(headers: &HeaderMap, raw_body: Bytes) -> Result<Self, WebhookError> {
        let value = headers
            .get(SIGNATURE_HEADER)
            .ok_or(WebhookError::MissingSignature)?;

        if value.is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let signature = value
            .to_str()
            .map_err(|_| {
                warn!("Upstash-Signature header is not valid ASCII");
                WebhookError::InvalidSignature
            })?
            .to_string();

        Ok(Self {
            signature,
            raw_body,
            received_at: Utc::now(),
        })
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Verify the signature. The key is only consulted after the header was
    /// found, so a missing header and a missing key stay distinguishable.
    pub fn verify(self, key: Option<&SigningKey>) -> Result<VerifiedWebhook, WebhookError> {
        let key = key.ok_or(WebhookError::SigningKeyNotConfigured)?;

        let claims = decode::<VerifiedClaims>(
            &self.signature,
            &key.decoding_key,
            &SigningKey::validation(),
        )
        .map_err(|e| {
            warn!(error = %e, "JWT verification failed");
            WebhookError::InvalidSignature
        })?
        .claims;

        if let Some(expected) = claims.body.as_deref() {
            let actual = URL_SAFE_NO_PAD.encode(Sha256::digest(&self.raw_body));
            if expected.trim_end_matches('=') != actual {
                warn!("JWT body hash does not match request body");
                return Err(WebhookError::InvalidSignature);
            }
        }

        debug!(
            iss = ?claims.iss,
            sub = ?claims.sub,
            jti = ?claims.jti,
            "JWT signature verified"
        );

        Ok(VerifiedWebhook {
            claims,
            body: self.raw_body,
            received_at: self.received_at,
        })
    }
}

/// A webhook whose signature checked out. Only obtainable through
/// [`WebhookEnvelope::verify`], so holding one proves the body is trusted.
#[derive(Debug)]
pub struct VerifiedWebhook {
    claims: VerifiedClaims,
    body: Bytes,
    received_at: DateTime<Utc>,
}

impl VerifiedWebhook {
    pub fn claims(&self) -> &VerifiedClaims {
        &self.claims
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Run the full header → key → signature sequence on a request.
pub fn verify_request(
    headers: &HeaderMap,
    body: Bytes,
    key: Option<&SigningKey>,
) -> Result<VerifiedWebhook, WebhookError> {
    WebhookEnvelope::from_parts(headers, body)?.verify(key)
}
