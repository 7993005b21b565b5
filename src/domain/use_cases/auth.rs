use chrono::Utc;
use deadpool_redis::Pool as RedisPool;
use redis::AsyncCommands;
use validator::Validate;
use zeroize::Zeroizing;

use crate::auth::password::verify_password;
use crate::entities::token::{AuthResponse, LoginRequest};
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::AppConfig;

const ACCESS_DENY_PREFIX: &str = "access_deny";
const REFRESH_DENY_PREFIX: &str = "refresh_deny";

/// Signs allow-listed administrators in and out.
pub struct AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub token_service: T,
    admin_emails: Vec<String>,
    admin_password_hash: Zeroizing<String>,
    redis_pool: Option<RedisPool>,
}

impl<T> AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub fn new(token_service: T, config: &AppConfig, redis_pool: Option<RedisPool>) -> Self {
        AuthHandler {
            token_service,
            admin_emails: config.admin_allow_list(),
            admin_password_hash: Zeroizing::new(config.admin_password_hash.clone()),
            redis_pool,
        }
    }

    /// Case-insensitive allow-list check.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|allowed| *allowed == email)
    }

    pub fn has_revocation_store(&self) -> bool {
        self.redis_pool.is_some()
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let allowed = self.is_admin(&email);

        // The hash is checked for unknown emails too, so both paths cost the same.
        let password_ok = verify_password(&request.password, &self.admin_password_hash)?;
        if !allowed || !password_ok {
            tracing::warn!(allowed, "Rejected admin sign-in");
            return Err(AuthError::WrongCredentials);
        }

        let response = self.create_auth_response(&email)?;
        tracing::info!("Administrator signed in");
        Ok(response)
    }

    pub fn create_auth_response(&self, email: &str) -> Result<AuthResponse, AuthError> {
        let access_token = self.token_service.create_jwt(email, self.is_admin(email))?;
        let refresh_token = self.token_service.create_refresh_jwt(email)?;
        Ok(AuthResponse::new(access_token, refresh_token))
    }

    /// Rotates the pair. The old refresh token is revoked when Redis is available.
    pub async fn refresh_token(&self, token: &str) -> Result<AuthResponse, AuthError> {
        if self.is_revoked(REFRESH_DENY_PREFIX, token).await? {
            return Err(AuthError::TokenRevoked);
        }

        let claims = self.token_service.decode_refresh_jwt(token)?.claims;
        if !self.is_admin(&claims.sub) {
            return Err(AuthError::Forbidden("Account is no longer an administrator".into()));
        }

        let response = self.create_auth_response(&claims.sub)?;
        self.revoke(REFRESH_DENY_PREFIX, token, claims.exp).await?;
        Ok(response)
    }

    pub async fn logout(&self, refresh_token: &str, access_token: &str) -> Result<(), AuthError> {
        let refresh = self.token_service.decode_refresh_jwt(refresh_token)?.claims;
        let access = self.token_service.decode_jwt(access_token)?.claims;

        if refresh.sub != access.sub {
            return Err(AuthError::InvalidToken);
        }

        self.revoke(REFRESH_DENY_PREFIX, refresh_token, refresh.exp).await?;
        self.revoke(ACCESS_DENY_PREFIX, access_token, access.exp).await?;
        tracing::info!(revocation = self.has_revocation_store(), "Administrator signed out");
        Ok(())
    }

    pub async fn is_access_revoked(&self, token: &str) -> Result<bool, AuthError> {
        self.is_revoked(ACCESS_DENY_PREFIX, token).await
    }

    async fn revoke(&self, prefix: &str, token: &str, exp: usize) -> Result<(), AuthError> {
        let Some(pool) = &self.redis_pool else {
            return Ok(());
        };

        let now = Utc::now().timestamp() as usize;
        let ttl = exp.saturating_sub(now) as u64;
        if ttl == 0 {
            return Ok(());
        }

        let mut conn = pool
            .get()
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))?;
        conn.set_ex::<_, _, ()>(format!("{prefix}:{token}"), 1, ttl)
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }

    async fn is_revoked(&self, prefix: &str, token: &str) -> Result<bool, AuthError> {
        let Some(pool) = &self.redis_pool else {
            return Ok(false);
        };

        let mut conn = pool
            .get()
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))?;
        conn.exists::<_, bool>(format!("{prefix}:{token}"))
            .await
            .map_err(|e| AuthError::RedisOperation(e.to_string()))
    }
}
