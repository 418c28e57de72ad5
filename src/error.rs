use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr};
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{AmountOverflow, UnknownStatus},
    response::{ApiResponse, Meta},
};

/// Name of the exclusion constraint that keeps occupying bookings of one room
/// from overlapping.
pub const NO_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Room unavailable: {0}")]
    AvailabilityConflict(String),

    #[error("Payment exceeds remaining balance of {remaining}")]
    Overpayment { remaining: i64 },

    #[error("Storage unavailable")]
    StorageUnavailable(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(sqlx::Error),

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::StateConflict(_) => "state_conflict",
            AppError::AvailabilityConflict(_) => "availability_conflict",
            AppError::Overpayment { .. } => "overpayment",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StateConflict(_) | AppError::AvailabilityConflict(_) => StatusCode::CONFLICT,
            AppError::Overpayment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Connection-level failures and the overlap constraint get their own
/// variants; everything else stays an opaque database error.
fn classify_sqlx(err: &sqlx::Error) -> Option<AppError> {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => Some(AppError::StorageUnavailable(err.to_string())),
        sqlx::Error::Database(db) if db.constraint() == Some(NO_OVERLAP_CONSTRAINT) => Some(
            AppError::AvailabilityConflict("room already booked for an overlapping stay".into()),
        ),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        classify_sqlx(&err).unwrap_or(AppError::DbError(err))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let DbErr::Exec(RuntimeErr::SqlxError(inner))
        | DbErr::Query(RuntimeErr::SqlxError(inner))
        | DbErr::Conn(RuntimeErr::SqlxError(inner)) = &err
        {
            if let Some(classified) = classify_sqlx(inner) {
                return classified;
            }
        }
        match err {
            e @ (DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) => {
                AppError::StorageUnavailable(e.to_string())
            }
            other => AppError::OrmError(other),
        }
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<UnknownStatus> for AppError {
    fn from(err: UnknownStatus) -> Self {
        AppError::Internal(err.into())
    }
}

#[derive(Serialize)]
struct ErrorData {
    code: &'static str,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            AppError::StorageUnavailable(detail) => {
                tracing::warn!(detail = %detail, "storage unavailable")
            }
            _ => {}
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                code: self.code(),
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        assert_eq!(AppError::NotFound("Booking").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation("bad dates".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::StateConflict("checked out".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Overpayment { remaining: 0 }.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::StorageUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::NotFound("Invoice").to_string(), "Invoice not found");
    }

    #[test]
    fn pool_timeouts_are_storage_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "storage_unavailable");

        let err: AppError = DbErr::Conn(RuntimeErr::Internal("refused".into())).into();
        assert_eq!(err.code(), "storage_unavailable");

        let err: AppError = DbErr::RecordNotInserted.into();
        assert_eq!(err.code(), "internal");
    }
}
