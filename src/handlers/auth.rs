use crate::{
    auth::{AdminUser, AuthRouterExt, AuthUser, CreateUserRequest, LoginRequest, TokenResponse, UserProfile},
    errors::ErrorResponse,
    handlers::common::{created, ok, ApiResult, CreatedResult},
    handlers::extract::ApiJson,
    models::UserRole,
    AppState, ApiResponse,
};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Login is public; `/me` needs a token; user management is ADMIN only.
pub fn routes(auth: Arc<crate::auth::AuthService>) -> Router<AppState> {
    let public = Router::new().route("/login", post(login));
    let authenticated = Router::new()
        .route("/me", get(me))
        .with_auth(auth.clone());
    let admin = Router::new()
        .route("/users", post(create_user))
        .with_role(auth, UserRole::Admin);

    public.merge(authenticated).merge(admin)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = state.auth.login(payload).await?;
    Ok(ok(token, "Login successful"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.auth.get_user(user.user_id).await?;
    Ok(ok(profile.into(), "Current user"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> CreatedResult<UserProfile> {
    let user = state.auth.create_user(payload).await?;
    Ok(created(user.into(), "User created"))
}
