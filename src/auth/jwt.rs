use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, TokenClaim, REGISTERED_CLAIMS};
use super::repo_types::User;
use crate::config::JwtConfig;

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }
}

/// Rejections raised by the bearer-token gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header")]
    InvalidScheme,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

impl JwtKeys {
    /// Signs a token carrying issuer, audience, issue/expiry times and `claims`.
    pub fn generate(&self, claims: &[TokenClaim]) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| anyhow::anyhow!("token lifetime {:?} is out of range", self.ttl))?;

        let mut payload = Map::new();
        payload.insert("iss".into(), Value::from(self.issuer.clone()));
        payload.insert("aud".into(), Value::from(self.audience.clone()));
        payload.insert("iat".into(), Value::from(now.unix_timestamp()));
        payload.insert("exp".into(), Value::from(exp.unix_timestamp()));
        for claim in claims {
            if REGISTERED_CLAIMS.contains(&claim.name) {
                anyhow::bail!("claim `{}` is reserved", claim.name);
            }
            payload.insert(claim.name.into(), Value::from(claim.value.clone()));
        }

        let token = encode(&Header::default(), &payload, &self.encoding)?;
        debug!(claims = claims.len(), "jwt signed");
        Ok(token)
    }

    pub fn sign_user(&self, user: &User) -> anyhow::Result<String> {
        self.generate(&[
            TokenClaim::new("userId", user.id.to_string()),
            TokenClaim::new("userEmail", user.username.clone()),
        ])
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(AuthError::InvalidToken)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

/// Bearer gate: the decoded claims of a valid, unexpired token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AuthError::InvalidScheme)?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!(error = ?e, "invalid or expired token");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "u1@test.com".into(),
            password_hash: "h".into(),
            salt: "s".into(),
        }
    }

    #[test]
    fn sign_and_verify_user_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user = user();
        let token = keys.sign_user(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.user_email, "u1@test.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.sign_user(&user()).expect("sign");
        assert!(matches!(bad.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let ours = make_keys("ours", "iss", "aud");
        let theirs = make_keys("theirs", "iss", "aud");
        let token = theirs.sign_user(&user()).expect("sign");
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            user_id: "1".into(),
            user_email: "u1@test.com".into(),
            iat: (past - TimeDuration::hours(1)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_without_identity_claims_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.generate(&[]).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        for ttl_minutes in [1_000_000_000_000, i64::MAX] {
            let keys = JwtKeys::from(&JwtConfig {
                secret: "dev-secret".into(),
                issuer: "iss".into(),
                audience: "aud".into(),
                ttl_minutes,
            });
            let err = keys.sign_user(&user()).unwrap_err();
            assert!(err.to_string().contains("out of range"), "{err}");
        }
    }

    #[test]
    fn generate_refuses_registered_claim_names() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let err = keys
            .generate(&[TokenClaim::new("exp", "0")])
            .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }
}
