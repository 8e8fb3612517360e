//! Bearer token verification.
//!
//! Identity tokens are EdDSA (Ed25519) JWTs issued by the identity
//! provider. The server only verifies them; it never issues tokens.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use musubi_core::error::MusubiError;
use musubi_core::models::user::VerifiedIdentity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::ApiError;

/// Claims carried by identity tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable user id.
    pub sub: String,
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Photo URL.
    #[serde(default)]
    pub picture: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<IdentityClaims> for VerifiedIdentity {
    fn from(claims: IdentityClaims) -> Self {
        let display_name = claims
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| claims.email.clone());
        VerifiedIdentity {
            uid: claims.sub,
            email: claims.email,
            display_name,
            photo_url: claims.picture,
        }
    }
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> Result<Self, MusubiError> {
        let key = DecodingKey::from_ed_pem(config.public_key_pem.as_bytes())
            .map_err(|e| MusubiError::Internal(format!("bad public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, MusubiError> {
        jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                let reason = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "token has expired".into(),
                    _ => format!("invalid token: {e}"),
                };
                MusubiError::AuthenticationFailed { reason }
            })
    }
}

/// The verified caller of an `/api` request.
#[derive(Debug, Clone)]
pub struct Caller(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Caller
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("missing bearer token"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("missing bearer token"))?;

        let verifier = Arc::<TokenVerifier>::from_ref(state);
        let identity = verifier.verify(token)?;
        debug!(uid = %identity.uid, "Authenticated request");
        Ok(Caller(identity))
    }
}

fn unauthorized(reason: &str) -> ApiError {
    MusubiError::AuthenticationFailed {
        reason: reason.into(),
    }
    .into()
}
