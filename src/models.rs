use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::schema::{bookings, travel_options};
use chrono::NaiveDateTime;
use diesel::{deserialize::{self, FromSql}, pg::{Pg, PgValue}, prelude::*, serialize::{self, Output, ToSql}, sql_types::Text};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::TravelType)]
#[serde(rename_all = "lowercase")]
pub enum TravelType {
    Flight,
    Train,
    Bus,
}

impl TravelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Flight => "flight",
            TravelType::Train => "train",
            TravelType::Bus => "bus",
        }
    }

    /// Nominal seat count of one vehicle of this kind.
    pub fn estimated_capacity(&self) -> i32 {
        match self {
            TravelType::Flight => 150,
            TravelType::Train => 200,
            TravelType::Bus => 50,
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flight" => Ok(TravelType::Flight),
            "train" => Ok(TravelType::Train),
            "bus" => Ok(TravelType::Bus),
            other => Err(format!("unknown travel type '{}', expected one of flight, train, bus", other)),
        }
    }
}

impl ToSql<crate::schema::sql_types::TravelType, Pg> for TravelType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<crate::schema::sql_types::TravelType, Pg> for TravelType {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse::<TravelType>().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = crate::schema::sql_types::BookingStatus)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl ToSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match *self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        };
        <str as ToSql<Text, Pg>>::to_sql(s, out)
    }
}

impl FromSql<crate::schema::sql_types::BookingStatus, Pg> for BookingStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            s => Err(format!("Unrecognized booking status: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = travel_options)]
#[diesel(check_for_backend(Pg))]
pub struct TravelOption {
    pub travel_id: i32,
    #[serde(rename = "type")]
    pub travel_type: TravelType,
    pub source: String,
    pub destination: String,
    pub date_time: NaiveDateTime,
    pub price: Decimal,
    pub available_seats: i32,
}

/// How urgently a traveller should book, bucketed by remaining seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrgencyLevel {
    SoldOut,
    Critical,
    Low,
    Medium,
    High,
}

impl TravelOption {
    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.available_seats > 0 && self.available_seats <= 10
    }

    pub fn urgency_level(&self) -> UrgencyLevel {
        match self.available_seats {
            n if n <= 0 => UrgencyLevel::SoldOut,
            1..=5 => UrgencyLevel::Critical,
            6..=15 => UrgencyLevel::Low,
            16..=50 => UrgencyLevel::Medium,
            _ => UrgencyLevel::High,
        }
    }

    /// Share of the estimated capacity already booked, as a percentage with
    /// one decimal place. Never negative, even when the option was seeded
    /// with more seats than the nominal capacity.
    pub fn occupancy_percentage(&self) -> f64 {
        let capacity = self.travel_type.estimated_capacity();
        let booked = (capacity - self.available_seats).max(0);
        let pct = f64::from(booked) / f64::from(capacity) * 100.0;
        (pct * 10.0).round() / 10.0
    }
}

impl fmt::Display for TravelOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} to {}", self.travel_type, self.source, self.destination)
    }
}

/// A travel option decorated with the availability indicators shown to users.
#[derive(Debug, Serialize)]
pub struct TravelOptionView {
    #[serde(flatten)]
    pub option: TravelOption,
    pub is_sold_out: bool,
    pub is_low_stock: bool,
    pub urgency_level: UrgencyLevel,
    pub estimated_capacity: i32,
    pub occupancy_percentage: f64,
}

impl From<TravelOption> for TravelOptionView {
    fn from(option: TravelOption) -> Self {
        Self {
            is_sold_out: option.is_sold_out(),
            is_low_stock: option.is_low_stock(),
            urgency_level: option.urgency_level(),
            estimated_capacity: option.travel_type.estimated_capacity(),
            occupancy_percentage: option.occupancy_percentage(),
            option,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(Pg))]
pub struct Booking {
    pub booking_id: i32,
    pub user_id: String,
    pub travel_id: i32,
    pub number_of_seats: i32,
    pub total_price: Decimal,
    pub booking_date: NaiveDateTime,
    pub status: BookingStatus,
}

impl fmt::Display for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Booking {} by {}", self.booking_id, self.user_id)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub user_id: String,
    pub travel_id: i32,
    pub number_of_seats: i32,
    pub total_price: Decimal,
    pub booking_date: NaiveDateTime,
    pub status: BookingStatus,
}

// Request/Response models for API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TravelOptionQuery {
    #[serde(rename = "type")]
    pub travel_type: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    pub seats: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub message: String,
    pub booking: Booking,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn option(travel_type: TravelType, available_seats: i32) -> TravelOption {
        TravelOption {
            travel_id: 1,
            travel_type,
            source: "New York".to_string(),
            destination: "Los Angeles".to_string(),
            date_time: NaiveDate::from_ymd_opt(2026, 11, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            price: Decimal::new(29999, 2),
            available_seats,
        }
    }

    #[test]
    fn travel_option_displays_route() {
        assert_eq!(option(TravelType::Flight, 150).to_string(), "flight from New York to Los Angeles");
    }

    #[test]
    fn booking_displays_owner() {
        let booking = Booking {
            booking_id: 42,
            user_id: "testuser".to_string(),
            travel_id: 1,
            number_of_seats: 2,
            total_price: Decimal::new(17998, 2),
            booking_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(12, 0, 0).unwrap(),
            status: BookingStatus::Confirmed,
        };
        assert_eq!(booking.to_string(), "Booking 42 by testuser");
    }

    #[test]
    fn urgency_levels_follow_remaining_seats() {
        let cases = [
            (0, UrgencyLevel::SoldOut),
            (1, UrgencyLevel::Critical),
            (5, UrgencyLevel::Critical),
            (6, UrgencyLevel::Low),
            (15, UrgencyLevel::Low),
            (16, UrgencyLevel::Medium),
            (50, UrgencyLevel::Medium),
            (51, UrgencyLevel::High),
        ];
        for (seats, expected) in cases {
            assert_eq!(option(TravelType::Bus, seats).urgency_level(), expected, "seats = {}", seats);
        }
    }

    #[test]
    fn stock_flags() {
        assert!(option(TravelType::Train, 0).is_sold_out());
        assert!(!option(TravelType::Train, 0).is_low_stock());
        assert!(option(TravelType::Train, 10).is_low_stock());
        assert!(!option(TravelType::Train, 11).is_low_stock());
    }

    #[test]
    fn occupancy_uses_nominal_capacity() {
        assert_eq!(option(TravelType::Flight, 150).occupancy_percentage(), 0.0);
        assert_eq!(option(TravelType::Bus, 25).occupancy_percentage(), 50.0);
        assert_eq!(option(TravelType::Train, 133).occupancy_percentage(), 33.5);
        assert_eq!(option(TravelType::Bus, 80).occupancy_percentage(), 0.0);
    }

    #[test]
    fn view_serializes_type_and_indicators() {
        let view = TravelOptionView::from(option(TravelType::Flight, 3));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "flight");
        assert_eq!(json["price"], "299.99");
        assert_eq!(json["urgency_level"], "critical");
        assert_eq!(json["is_low_stock"], true);
        assert_eq!(json["estimated_capacity"], 150);
    }

    #[test]
    fn travel_type_parses_lowercase_names_only() {
        assert_eq!("train".parse::<TravelType>(), Ok(TravelType::Train));
        assert!("Train".parse::<TravelType>().is_err());
        assert!("boat".parse::<TravelType>().is_err());
    }
}
