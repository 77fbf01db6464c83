use std::future::{ready, Ready};
use std::sync::OnceLock;

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use regex::Regex;

use crate::errors::BookingError;

/// Header carrying the username resolved by the upstream authenticator.
pub const USER_HEADER: &str = "X-User-Id";

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9@.+_-]{1,150}$").unwrap())
}

/// The user on whose behalf a request acts.
///
/// Handlers that mutate or list bookings take this as an argument; a request
/// without a valid identity is rejected with 401 before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: &str) -> Result<Self, BookingError> {
        if !username_re().is_match(user_id) {
            return Err(BookingError::Unauthenticated);
        }
        Ok(Self { user_id: user_id.to_owned() })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn from_headers(headers: &HeaderMap) -> Result<Self, BookingError> {
        let value = headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(BookingError::Unauthenticated)?;
        Self::new(value.trim())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = BookingError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req.headers()))
    }
}
