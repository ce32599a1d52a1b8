//! Bearer token verification (HS256, zero clock skew).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};

use qsadmin_core::{RoleId, UserId};

use crate::{JwtClaims, TokenValidationError, validate_claims};

/// Issuer/audience/secret triple shared by token minting and validation.
#[derive(Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    pub secret: Vec<u8>,
}

impl core::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl JwtSettings {
    /// Claims for `user_id` valid from `now` for `ttl_secs` seconds.
    pub fn claims_for(&self, user_id: UserId, roles: Vec<RoleId>, now: i64, ttl_secs: i64) -> JwtClaims {
        JwtClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: user_id,
            roles,
            iat: now,
            exp: now + ttl_secs,
        }
    }
}

/// Verifies a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    /// `now` is Unix seconds; the claims' time window is checked against it.
    fn validate(&self, token: &str, now: i64) -> Result<JwtClaims, TokenValidationError>;
}

/// HMAC-SHA256 validator (and issuer) for symmetric secrets.
pub struct Hs256JwtValidator {
    settings: JwtSettings,
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(settings: JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);

        Self {
            decoding: DecodingKey::from_secret(&settings.secret),
            encoding: EncodingKey::from_secret(&settings.secret),
            validation,
            settings,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Sign `claims` with the configured secret.
    pub fn issue(&self, claims: &JwtClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenValidationError::Invalid(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: i64) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenValidationError::Expired,
                ErrorKind::ImmatureSignature => TokenValidationError::NotYetValid,
                ErrorKind::InvalidIssuer => TokenValidationError::InvalidIssuer,
                ErrorKind::InvalidAudience => TokenValidationError::InvalidAudience,
                ErrorKind::InvalidSignature => TokenValidationError::InvalidSignature,
                _ => TokenValidationError::Invalid(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secret: &str) -> JwtSettings {
        JwtSettings {
            issuer: "qsadmin".into(),
            audience: "qsadmin-admin".into(),
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn issued_token_round_trips_through_validation() {
        let v = Hs256JwtValidator::new(settings("s3cret"));
        let role = RoleId::new();
        let claims = v.settings().claims_for(UserId::new(), vec![role], now(), 600);
        let token = v.issue(&claims).unwrap();

        let got = v.validate(&token, now()).unwrap();
        assert_eq!(got, claims);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let minted = Hs256JwtValidator::new(settings("one"));
        let checker = Hs256JwtValidator::new(settings("two"));
        let token = minted
            .issue(&minted.settings().claims_for(UserId::new(), vec![], now(), 600))
            .unwrap();

        assert_eq!(
            checker.validate(&token, now()),
            Err(TokenValidationError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_audience_and_issuer_are_rejected() {
        let v = Hs256JwtValidator::new(settings("s"));

        let mut claims = v.settings().claims_for(UserId::new(), vec![], now(), 600);
        claims.aud = "someone-else".into();
        let token = v.issue(&claims).unwrap();
        assert_eq!(v.validate(&token, now()), Err(TokenValidationError::InvalidAudience));

        let mut claims = v.settings().claims_for(UserId::new(), vec![], now(), 600);
        claims.iss = "rogue".into();
        let token = v.issue(&claims).unwrap();
        assert_eq!(v.validate(&token, now()), Err(TokenValidationError::InvalidIssuer));
    }

    #[test]
    fn expired_token_is_rejected_without_leeway() {
        let v = Hs256JwtValidator::new(settings("s"));
        let t = now();
        let claims = v.settings().claims_for(UserId::new(), vec![], t - 120, 60);
        let token = v.issue(&claims).unwrap();

        assert_eq!(v.validate(&token, t), Err(TokenValidationError::Expired));
    }

    #[test]
    fn garbage_is_invalid() {
        let v = Hs256JwtValidator::new(settings("s"));
        assert!(matches!(
            v.validate("not.a.jwt", now()),
            Err(TokenValidationError::Invalid(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", settings("topsecret"));
        assert!(!dbg.contains("topsecret"));
    }
}
