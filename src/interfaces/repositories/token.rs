use jsonwebtoken::TokenData;

use crate::{
    entities::token::{Claims, RefreshClaims},
    errors::AuthError,
};

pub trait TokenServiceRepository: Send + Sync {
    /// Creates an access token for the given administrator email
    fn create_jwt(&self, email: &str, admin: bool) -> Result<String, AuthError>;

    /// Creates a refresh token for the given administrator email
    fn create_refresh_jwt(&self, email: &str) -> Result<String, AuthError>;

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError>;
}
