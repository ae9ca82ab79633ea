use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shop_models::{CartError, DepositError, TransitionError};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum ShopServerError {
    #[snafu(display("Database query failed: {}", source))]
    DatabaseQuery { source: sqlx::Error },

    #[snafu(display("Record not found"))]
    NotFound,

    #[snafu(display("Invalid data format: {}", message))]
    InvalidData { message: String },

    #[snafu(display("Database migration failed: {}", source))]
    Migration { source: sqlx::migrate::MigrateError },

    #[snafu(display("Invalid state: {}", message))]
    InvalidState { message: String },

    #[snafu(display("API validation error: {}", message))]
    Validation { message: String },

    #[snafu(display("Conflict: {}", message))]
    Conflict { message: String },

    #[snafu(display("Internal server error: {}", message))]
    Internal { message: String },
}

impl From<sqlx::Error> for ShopServerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ShopServerError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ShopServerError::Conflict {
                    message: db_err.message().to_string(),
                }
            }
            _ => ShopServerError::DatabaseQuery { source: err },
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ShopServerError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ShopServerError::Migration { source: err }
    }
}

impl From<TransitionError> for ShopServerError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InsufficientPayment { .. }
            | TransitionError::PaymentOverflow { .. } => ShopServerError::Validation {
                message: err.to_string(),
            },
            _ => ShopServerError::InvalidState {
                message: err.to_string(),
            },
        }
    }
}

impl From<DepositError> for ShopServerError {
    fn from(err: DepositError) -> Self {
        match err {
            DepositError::Overlap { .. } => ShopServerError::Conflict {
                message: err.to_string(),
            },
            _ => ShopServerError::Validation {
                message: err.to_string(),
            },
        }
    }
}

impl From<CartError> for ShopServerError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InsufficientStock { .. } => ShopServerError::Conflict {
                message: err.to_string(),
            },
            _ => ShopServerError::Validation {
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ShopServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ShopServerError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
            ShopServerError::Validation { .. } => (StatusCode::BAD_REQUEST, "Validation error"),
            ShopServerError::Conflict { .. } => (StatusCode::CONFLICT, "Resource conflict"),
            ShopServerError::InvalidState { .. } => (StatusCode::CONFLICT, "Invalid order state"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": error_message,
                "details": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ShopServerResult<T> = Result<T, ShopServerError>;
