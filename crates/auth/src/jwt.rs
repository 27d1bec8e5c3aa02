use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tracing::debug;

use crate::claims::{ActorClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ActorClaims, TokenValidationError>;
}

/// HMAC-SHA256 validator over a shared secret.
///
/// Token time windows use the RFC 3339 `issued_at`/`expires_at` claims, so the
/// registered `exp` claim is neither required nor checked by the decoder.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ActorClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<ActorClaims>(token, &self.key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "jwt rejected");
                TokenValidationError::Malformed(e.to_string())
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use echoledger_core::ActorId;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(secret: &str, claims: &ActorClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_token_signed_with_same_secret() {
        let now = Utc::now();
        let claims = ActorClaims::new(ActorId::new(), now, Duration::minutes(10));
        let validator = Hs256JwtValidator::new("s3cret");

        let decoded = validator.validate(&mint("s3cret", &claims), now).unwrap();

        assert_eq!(decoded.sub, claims.sub);
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let now = Utc::now();
        let claims = ActorClaims::new(ActorId::new(), now, Duration::minutes(10));
        let validator = Hs256JwtValidator::new("s3cret");

        assert!(matches!(
            validator.validate(&mint("other", &claims), now),
            Err(TokenValidationError::Malformed(_))
        ));
        assert!(matches!(
            validator.validate("not.a.jwt", now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let issued = Utc::now() - Duration::hours(2);
        let claims = ActorClaims::new(ActorId::from_uuid(uuid::Uuid::now_v7()), issued, Duration::hours(1));
        let validator = Hs256JwtValidator::new("s3cret");

        assert_eq!(
            validator.validate(&mint("s3cret", &claims), Utc::now()),
            Err(TokenValidationError::Expired)
        );
    }
}
