//! JWT authentication and role gating.
//!
//! Access tokens are HS256 JWTs carrying the user id, email and role. The
//! [`auth_middleware`] validates the bearer token and stores an [`AuthUser`]
//! in the request extensions; handlers pull it back out with the
//! [`AuthUser`] or [`AdminUser`] extractors.

use crate::{
    errors::ServiceError,
    models::{
        user::{self, Entity as User},
        UserRole,
    },
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub email: String,  // User's email
    pub role: UserRole, // Single role per account
    pub jti: String,    // JWT ID
    pub iat: i64,       // Issued at time
    pub exp: i64,       // Expiration time
    pub iss: String,    // Issuer
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Roles are ordered ADMIN > MANAGER > STAFF; a higher role satisfies a
    /// lower requirement.
    pub fn has_role(&self, required: UserRole) -> bool {
        role_rank(self.role) >= role_rank(required)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

fn role_rank(role: UserRole) -> u8 {
    match role {
        UserRole::Staff => 0,
        UserRole::Manager => 1,
        UserRole::Admin => 2,
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that only admits ADMIN users.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "This operation requires the ADMIN role".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_expiration: std::time::Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, expiration_secs: u64) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            access_token_expiration: std::time::Duration::from_secs(expiration_secs),
        }
    }
}

impl From<&crate::config::AppConfig> for AuthConfig {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.jwt_expiration as u64,
        )
    }
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = User)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[serde(default = "default_user_role")]
    pub role: UserRole,
}

fn default_user_role() -> UserRole {
    UserRole::Staff
}

/// Issues and validates tokens and manages user accounts.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Generate a JWT access token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token has expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, ServiceError> {
        request.validate()?;
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let user = User::find()
            .filter(user::Column::Email.eq(request.email.to_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(invalid)?;

        if !user.is_active || !verify_password(&request.password, &user.password_hash) {
            warn!("rejected login attempt");
            return Err(invalid());
        }

        let access_token = self.generate_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            user: user.into(),
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<user::Model, ServiceError> {
        request.validate()?;
        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email.to_lowercase()),
            password_hash: Set(password_hash),
            full_name: Set(request.full_name.trim().to_string()),
            role: Set(request.role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model
            .insert(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "A user with this email already exists"))?;
        info!(user_id = %created.id, "user created");
        Ok(created)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Authentication middleware that validates the bearer token
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
    let user = auth_service.authenticate(token)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Role middleware; must run after [`auth_middleware`]
pub async fn role_middleware(
    State(required_role): State<UserRole>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;

    if !user.has_role(required_role) {
        return Err(ServiceError::Forbidden(format!(
            "This operation requires the {} role",
            required_role
        )));
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, auth: Arc<AuthService>) -> Self;
    fn with_role(self, auth: Arc<AuthService>, role: UserRole) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn with_role(self, auth: Arc<AuthService>, role: UserRole) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn service() -> AuthService {
        AuthService::new(
            AuthConfig::new("a".repeat(32), "workshop-api".to_string(), 3600),
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    fn sample_user(role: UserRole) -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            email: "admin@workshop.test".to_string(),
            password_hash: String::new(),
            full_name: "Admin".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let svc = service();
        let user = sample_user(UserRole::Manager);
        let token = svc.generate_token(&user).unwrap();
        let auth = svc.authenticate(&token).unwrap();
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.role, UserRole::Manager);
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let user = sample_user(UserRole::Staff);
        let other = AuthService::new(
            AuthConfig::new("a".repeat(32), "someone-else".to_string(), 3600),
            Arc::new(DatabaseConnection::Disconnected),
        );
        let token = other.generate_token(&user).unwrap();
        assert_matches!(
            service().validate_token(&token),
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        assert_matches!(
            service().validate_token("not-a-jwt"),
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[rstest]
    #[case(UserRole::Admin, UserRole::Admin, true)]
    #[case(UserRole::Admin, UserRole::Staff, true)]
    #[case(UserRole::Manager, UserRole::Staff, true)]
    #[case(UserRole::Manager, UserRole::Admin, false)]
    #[case(UserRole::Staff, UserRole::Manager, false)]
    fn role_hierarchy(#[case] held: UserRole, #[case] required: UserRole, #[case] ok: bool) {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "x@y.z".to_string(),
            role: held,
        };
        assert_eq!(user.has_role(required), ok);
    }
}
