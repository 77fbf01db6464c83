//! Typed validation of booking forms and filters, and the seat/price
//! arithmetic applied inside booking transactions.
//!
//! Nothing here touches the database: `actions` loads and locks the rows,
//! asks these functions what should change, and writes the result.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::auth::AuthenticatedUser;
use crate::errors::BookingError;
use crate::models::{Booking, BookingStatus, TravelOption, TravelOptionQuery, TravelType};

const DEFAULT_SEATS: i32 = 1;

/// Seat count from the booking form. An omitted field books one seat.
pub fn validate_seat_count(seats: Option<i32>) -> Result<i32, BookingError> {
    match seats.unwrap_or(DEFAULT_SEATS) {
        n if n < 1 => Err(BookingError::InvalidSeatCount(n)),
        n => Ok(n),
    }
}

/// Outcome of a successful seat reservation against one travel option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub seats: i32,
    pub total_price: Decimal,
    pub remaining_seats: i32,
}

/// Largest amount a `NUMERIC(10, 2)` column holds: 99 999 999.99.
pub fn max_total_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

pub fn total_price(price: Decimal, seats: i32) -> Decimal {
    (price * Decimal::from(seats)).round_dp(2)
}

/// Checks availability for `seats` on `option`.
pub fn reserve(option: &TravelOption, seats: i32) -> Result<Reservation, BookingError> {
    let seats = validate_seat_count(Some(seats))?;

    if seats > option.available_seats {
        return Err(BookingError::InsufficientSeats {
            requested: seats,
            available: option.available_seats,
        });
    }

    let total = total_price(option.price, seats);
    if total > max_total_price() {
        return Err(BookingError::TotalPriceTooLarge { total, max: max_total_price() });
    }

    Ok(Reservation {
        seats,
        total_price: total,
        remaining_seats: option.available_seats - seats,
    })
}

/// Checks that `user` may cancel `booking` and returns the number of seats
/// to hand back to its travel option.
pub fn release(booking: &Booking, user: &AuthenticatedUser) -> Result<i32, BookingError> {
    if booking.user_id != user.user_id() {
        return Err(BookingError::NotOwner { booking_id: booking.booking_id });
    }

    if booking.status == BookingStatus::Cancelled {
        return Err(BookingError::AlreadyCancelled);
    }

    Ok(booking.number_of_seats)
}

/// Parsed travel option filter. Every present predicate must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelFilter {
    pub travel_type: Option<TravelType>,
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Half-open `[start, end)` window covering one calendar day.
    pub day: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl TravelFilter {
    pub fn from_query(query: &TravelOptionQuery) -> Result<Self, BookingError> {
        let travel_type = non_empty(&query.travel_type)
            .map(|raw| {
                raw.parse::<TravelType>()
                    .map_err(|reason| BookingError::InvalidFilter { field: "type", reason })
            })
            .transpose()?;

        let day = non_empty(&query.date).map(parse_day).transpose()?;

        Ok(Self {
            travel_type,
            source: non_empty(&query.source).map(contains_pattern),
            destination: non_empty(&query.destination).map(contains_pattern),
            day,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_day(raw: &str) -> Result<(NaiveDateTime, NaiveDateTime), BookingError> {
    let invalid = |reason: String| BookingError::InvalidFilter { field: "date", reason };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| invalid(format!("'{}' is not a YYYY-MM-DD date: {}", raw, e)))?;
    let next = date
        .succ_opt()
        .ok_or_else(|| invalid(format!("'{}' is out of range", raw)))?;

    Ok((date.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN)))
}

/// ILIKE pattern matching `needle` anywhere, with `%`, `_` and `\` taken
/// literally.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
