use crate::{
    config::AppConfig,
    errors::ServiceError,
    services::{Page, PageRequest},
    ApiResponse,
};
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

/// Pagination parameters for list operations
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (default: 1)
    pub page: Option<u64>,
    /// Items per page (default and maximum come from configuration)
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn resolve(&self, config: &AppConfig) -> PageRequest {
        let max = u64::from(config.api_max_page_size).max(1);
        let limit = self
            .limit
            .unwrap_or(u64::from(config.api_default_page_size))
            .clamp(1, max);
        PageRequest::new(self.page.unwrap_or(1), limit)
    }
}

/// Standard pagination response metadata
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> From<&Page<T>> for PaginationMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}

pub fn ok<T: Serialize>(data: T, message: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data, message))
}

pub fn created<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data, message)))
}

pub fn paginated<T: Serialize>(page: Page<T>, message: &str) -> Json<ApiResponse<Vec<T>>> {
    let pagination = PaginationMeta::from(&page);
    Json(ApiResponse::paginated(page.items, pagination, message))
}

pub fn deleted(message: &str) -> Json<ApiResponse<()>> {
    Json(ApiResponse::message_only(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::new(
            "sqlite::memory:".into(),
            "a".repeat(32),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        config.api_default_page_size = 20;
        config.api_max_page_size = 100;
        config
    }

    #[test]
    fn limit_is_clamped_to_configured_maximum() {
        let params = PaginationParams {
            page: Some(0),
            limit: Some(500),
        };
        let page = params.resolve(&config());
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }

    #[test]
    fn defaults_apply_when_absent() {
        let page = PaginationParams::default().resolve(&config());
        assert_eq!(page, PageRequest::new(1, 20));
    }
}
