use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::ApiResponse;

/// Everything a booking request can fail with.
///
/// Validation and authorization failures are user-facing and carry the
/// message shown to the traveller. Infrastructure failures are logged and
/// answered with a generic message.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Only {available} seats available.")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("Total price {total} exceeds the maximum of {max}")]
    TotalPriceTooLarge { total: Decimal, max: Decimal },

    #[error("Number of seats must be at least 1, got {0}")]
    InvalidSeatCount(i32),

    #[error("This booking is already cancelled!")]
    AlreadyCancelled,

    #[error("Invalid {field} filter: {reason}")]
    InvalidFilter { field: &'static str, reason: String },

    #[error("Access denied: booking {booking_id} belongs to another user")]
    NotOwner { booking_id: i32 },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),
}

impl BookingError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BookingError::InsufficientSeats { .. }
                | BookingError::TotalPriceTooLarge { .. }
                | BookingError::InvalidSeatCount(_)
                | BookingError::AlreadyCancelled
                | BookingError::InvalidFilter { .. }
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, BookingError::NotOwner { .. })
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            BookingError::Database(_) | BookingError::Pool(_)
        )
    }
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InsufficientSeats { .. }
            | BookingError::TotalPriceTooLarge { .. }
            | BookingError::InvalidSeatCount(_)
            | BookingError::AlreadyCancelled
            | BookingError::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
            BookingError::NotOwner { .. } => StatusCode::FORBIDDEN,
            BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Database(_) | BookingError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("Request failed: {:?}", self);
            "Internal server error".to_string()
        } else {
            match self {
                BookingError::InsufficientSeats { requested, available } => {
                    log::warn!("Rejected request for {} seats, {} available", requested, available)
                }
                e if e.is_authorization() => log::warn!("Authorization failure: {}", e),
                e if e.is_validation() => log::warn!("Validation failure: {}", e),
                e => log::warn!("Request rejected: {}", e),
            }
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(ApiResponse { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn error_kinds_map_to_status_codes() {
        let cases = [
            (BookingError::InsufficientSeats { requested: 6, available: 5 }, StatusCode::BAD_REQUEST),
            (BookingError::InvalidSeatCount(0), StatusCode::BAD_REQUEST),
            (
                BookingError::TotalPriceTooLarge { total: Decimal::new(12_000_000_000, 2), max: Decimal::new(9_999_999_999, 2) },
                StatusCode::BAD_REQUEST,
            ),
            (BookingError::AlreadyCancelled, StatusCode::BAD_REQUEST),
            (BookingError::NotOwner { booking_id: 7 }, StatusCode::FORBIDDEN),
            (BookingError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (BookingError::NotFound("Booking"), StatusCode::NOT_FOUND),
            (BookingError::Database(diesel::result::Error::RollbackTransaction), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{:?}", err);
        }
    }

    #[test]
    fn validation_and_authorization_are_distinct() {
        assert!(BookingError::AlreadyCancelled.is_validation());
        assert!(!BookingError::AlreadyCancelled.is_authorization());
        assert!(BookingError::NotOwner { booking_id: 1 }.is_authorization());
        assert!(!BookingError::NotOwner { booking_id: 1 }.is_validation());
    }

    #[actix_web::test]
    async fn user_facing_message_is_returned() {
        let resp = BookingError::InsufficientSeats { requested: 9, available: 5 }.error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Only 5 seats available.");
    }

    #[actix_web::test]
    async fn internal_details_are_hidden() {
        let resp = BookingError::Database(diesel::result::Error::BrokenTransactionManager).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }
}
