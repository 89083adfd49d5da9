use actix_web::{http::StatusCode, ResponseError};
use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

use crate::response::response_from_error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Permission(&'static str),

    /// A multi-step write was rolled back. Callers may retry the whole operation.
    #[error("{op} failed at {step}")]
    TransactionFailed {
        op: &'static str,
        step: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("{step} failed")]
    Store {
        step: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("{op} timed out")]
    Timeout { op: &'static str },
}

impl AppError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }

    pub fn need_login() -> Self {
        Self::Permission("please login first")
    }

    pub fn admin_only() -> Self {
        Self::Permission("admin permission required")
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 1,
            Self::NotFound(_) => 2,
            Self::Permission(_) => 3,
            Self::TransactionFailed { .. } | Self::Timeout { .. } => 5,
            Self::Store { .. } => 99,
        }
    }

    pub fn msg(&self) -> String {
        match self {
            Self::Store { .. } => "system_exception".to_string(),
            other => other.to_string(),
        }
    }
}

/// Wraps a store error with the name of the step that produced it.
pub fn store(step: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |source| AppError::Store { step, source }
}

/// Flattens the outcome of `TransactionTrait::transaction`, tagging store
/// failures with the operation whose transaction was rolled back.
pub fn tx_error(op: &'static str) -> impl FnOnce(TransactionError<AppError>) -> AppError {
    move |err| match err {
        TransactionError::Connection(source) => AppError::TransactionFailed {
            op,
            step: "session",
            source,
        },
        TransactionError::Transaction(AppError::Store { step, source }) => {
            AppError::TransactionFailed { op, step, source }
        }
        TransactionError::Transaction(app) => app,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        response_from_error(self)
    }
}
