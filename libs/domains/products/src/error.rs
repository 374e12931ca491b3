use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Message returned to clients when a listing cannot be served
pub const LIST_FAILED_MESSAGE: &str = "Error fetching products";
/// Message returned to clients when a single product cannot be served
pub const FETCH_FAILED_MESSAGE: &str = "Error fetching product";
/// Message returned to clients for an unknown slug
pub const NOT_FOUND_MESSAGE: &str = "Product not found";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Listing products failed: {0}")]
    ListFailed(String),

    #[error("Fetching product failed: {0}")]
    FetchFailed(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Tag a storage failure as having happened while listing products
    pub fn while_listing(self) -> Self {
        match self {
            ProductError::Database(cause) => ProductError::ListFailed(cause),
            other => other,
        }
    }

    /// Tag a storage failure as having happened while fetching one product
    pub fn while_fetching(self) -> Self {
        match self {
            ProductError::Database(cause) => ProductError::FetchFailed(cause),
            other => other,
        }
    }
}

/// Convert ProductError to AppError for standardized error responses.
///
/// Storage causes are logged here and replaced by an opaque message.
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFound(NOT_FOUND_MESSAGE.to_string()),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::ListFailed(cause) => {
                tracing::error!(cause = %cause, "Failed to list products");
                AppError::InternalServerError(LIST_FAILED_MESSAGE.to_string())
            }
            ProductError::FetchFailed(cause) | ProductError::Database(cause) => {
                tracing::error!(cause = %cause, "Failed to fetch product");
                AppError::InternalServerError(FETCH_FAILED_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Database(err.to_string())
    }
}
