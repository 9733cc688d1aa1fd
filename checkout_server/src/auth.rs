//! Access tokens.
//!
//! Identity lives with an external provider. It issues HS256 JWTs, signed with the secret shared through
//! `CHECKOUT_JWT_SECRET`, that carry the caller's id, role and blocked flag. This module validates those tokens and turns
//! them into engine [`Principal`]s. [`TokenIssuer`] mints tokens with the same secret, for the identity provider's
//! benefit and for tests.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, http::header::HeaderMap, web, FromRequest, HttpMessage, HttpRequest};
use checkout_engine::db_types::{Principal, Role};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The caller's id with the identity provider. Orders and payments are owned by this id.
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub blocked: bool,
    /// Expiry, in seconds since the Unix epoch.
    pub exp: u64,
}

impl JwtClaims {
    pub fn principal(&self) -> Principal {
        Principal { id: self.sub.clone(), role: self.role, blocked: self.blocked }
    }

    /// Admins may do anything a user may do.
    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::User => true,
            Role::Admin => self.role == Role::Admin,
        }
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Principal { id: claims.sub, role: claims.role, blocked: claims.blocked }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string()))?;
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct TokenValidator {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = (!config.jwt_secret.is_empty())
            .then(|| DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes()));
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let key = self.key.as_ref().ok_or_else(|| {
            warn!("🔐️ Rejecting access token because no JWT secret has been configured");
            AuthError::ValidationError("Tokens cannot be validated".to_string())
        })?;
        let data = decode::<JwtClaims>(token, key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        trace!("🔐️ Access token validated for {} ({})", data.claims.sub, data.claims.role);
        Ok(data.claims)
    }

    /// Validates the bearer token carried by the request.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<JwtClaims, AuthError> {
        let token = bearer_token(headers)?;
        self.validate(token)
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    /// Issues an access token for `principal` that expires after `lifetime` (one day by default).
    pub fn issue_token(&self, principal: &Principal, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let lifetime = lifetime.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let exp = u64::try_from(Utc::now().timestamp()).unwrap_or_default() + lifetime.as_secs();
        let claims = JwtClaims { sub: principal.id.clone(), role: principal.role, blocked: principal.blocked, exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::SigningError(e.to_string()))
    }
}

/// Handlers behind the ACL middleware find the claims it already validated. Anywhere else, the token is validated here.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(claims.clone()));
        }
        let result = match req.app_data::<web::Data<TokenValidator>>() {
            Some(validator) => validator.authenticate(req.headers()).map_err(ServerError::from),
            None => {
                error!("🔐️ No token validator has been configured for this server");
                Err(ServerError::ConfigurationError("Access tokens cannot be validated".to_string()))
            },
        };
        ready(result)
    }
}
