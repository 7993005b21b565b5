use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};

use crate::entities::token::{Claims, RefreshClaims, TokenType};
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
    refresh_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
            refresh_expiration: Duration::days(config.refresh_token_exp_days),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, email: &str, admin: bool) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: email.to_string(),
            email: email.to_string(),
            admin,
            exp: (now + self.access_expiration).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: TokenType::Access,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode access token");
            AuthError::TokenCreation
        })
    }

    fn create_refresh_jwt(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = RefreshClaims {
            sub: email.to_string(),
            exp: (now + self.refresh_expiration).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: TokenType::Refresh,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.refresh_encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode refresh token");
            AuthError::TokenCreation
        })
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &Self::validation())?;
        if data.claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(data)
    }

    fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError> {
        let data = decode::<RefreshClaims>(token, &self.keys.refresh_decoding, &Self::validation())?;
        if data.claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidToken);
        }
        Ok(data)
    }
}
