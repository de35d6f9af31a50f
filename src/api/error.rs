use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::AppError;

use super::ErrorResponse;

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccountAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InsufficientFunds { .. } | AppError::BalanceOverflow(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Conflict(_) | AppError::Busy | AppError::Timeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::AccountCreationFailed { .. }
            | AppError::AccountVanished(_)
            | AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retryable = self.is_retryable();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        });

        let mut response = (status, body).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::storage::TxStage;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_fault_status_codes() {
        assert_eq!(
            AppError::Validation(ValidationError::SameAccount(1)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AccountNotFound(999).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AccountAlreadyExists(5).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InsufficientFunds {
                account_id: 1,
                balance: dec!(70.00),
                required: dec!(100.00),
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BalanceOverflow(1).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_server_fault_status_codes() {
        assert_eq!(
            AppError::AccountVanished(2).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Storage {
                stage: TxStage::Commit,
                message: "connection reset".into(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_retryable_errors_carry_retry_after() {
        let response = AppError::Conflict("could not serialize access".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");

        let response = AppError::AccountNotFound(1).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
