use diesel::prelude::*;
use chrono::Utc;
use crate::auth::AuthenticatedUser;
use crate::errors::BookingError;
use crate::models::{self, BookingStatus};
use crate::validation::{self, TravelFilter};

pub fn list_travel_options(conn: &mut PgConnection, filter: &TravelFilter) -> Result<Vec<models::TravelOption>, BookingError> {
    use crate::schema::travel_options::dsl::*;

    let mut query = travel_options
        .select(models::TravelOption::as_select())
        .into_boxed();

    if let Some(kind) = filter.travel_type {
        query = query.filter(travel_type.eq(kind));
    }
    if let Some(pattern) = &filter.source {
        query = query.filter(source.ilike(pattern.clone()));
    }
    if let Some(pattern) = &filter.destination {
        query = query.filter(destination.ilike(pattern.clone()));
    }
    if let Some((start, end)) = filter.day {
        query = query.filter(date_time.ge(start)).filter(date_time.lt(end));
    }

    let options = query
        .order((date_time.asc(), travel_id.asc()))
        .load(conn)?;

    Ok(options)
}

pub fn get_travel_option(conn: &mut PgConnection, id: i32) -> Result<models::TravelOption, BookingError> {
    use crate::schema::travel_options::dsl::travel_options;

    travel_options
        .find(id)
        .select(models::TravelOption::as_select())
        .first(conn)
        .optional()?
        .ok_or(BookingError::NotFound("Travel option"))
}

/// Reserves `seats` on travel option `travel` for `user`.
///
/// The option row is locked for the whole transaction, so concurrent
/// reservations see each other's decrements and can never oversell.
pub fn create_booking(
    conn: &mut PgConnection,
    travel: i32,
    user: &AuthenticatedUser,
    seats: i32
) -> Result<models::Booking, BookingError> {
    use crate::schema::{
        bookings::dsl::bookings,
        travel_options::dsl::{travel_options, available_seats}
    };

    conn.transaction(|conn| {
        let option: models::TravelOption = travel_options
            .find(travel)
            .select(models::TravelOption::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(BookingError::NotFound("Travel option"))?;

        let reservation = validation::reserve(&option, seats)?;

        diesel::update(travel_options.find(travel))
            .set(available_seats.eq(reservation.remaining_seats))
            .execute(conn)?;

        let new_booking = models::NewBooking {
            user_id: user.user_id().to_owned(),
            travel_id: travel,
            number_of_seats: reservation.seats,
            total_price: reservation.total_price,
            booking_date: Utc::now().naive_utc(),
            status: BookingStatus::Confirmed,
        };

        let booking = diesel::insert_into(bookings)
            .values(&new_booking)
            .returning(models::Booking::as_returning())
            .get_result(conn)?;

        Ok(booking)
    })
}

/// Cancels `id` on behalf of `user` and hands its seats back.
///
/// The booking row stays locked until commit, so two concurrent
/// cancellations cannot both see `confirmed` and return the seats twice.
pub fn cancel_booking(
    conn: &mut PgConnection,
    id: i32,
    user: &AuthenticatedUser
) -> Result<models::Booking, BookingError> {
    use crate::schema::{
        bookings::dsl::{bookings, status},
        travel_options::dsl::{travel_options, available_seats}
    };

    conn.transaction(|conn| {
        let booking: models::Booking = bookings
            .find(id)
            .select(models::Booking::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(BookingError::NotFound("Booking"))?;

        let released = validation::release(&booking, user)?;

        diesel::update(travel_options.find(booking.travel_id))
            .set(available_seats.eq(available_seats + released))
            .execute(conn)?;

        let cancelled = diesel::update(bookings.find(id))
            .set(status.eq(BookingStatus::Cancelled))
            .returning(models::Booking::as_returning())
            .get_result(conn)?;

        Ok(cancelled)
    })
}

pub fn list_user_bookings(
    conn: &mut PgConnection,
    user: &AuthenticatedUser
) -> Result<Vec<(models::Booking, models::TravelOption)>, BookingError> {
    use crate::schema::{bookings, travel_options};

    let rows = bookings::table
        .inner_join(travel_options::table)
        .filter(bookings::user_id.eq(user.user_id()))
        .order((bookings::booking_date.desc(), bookings::booking_id.desc()))
        .select((models::Booking::as_select(), models::TravelOption::as_select()))
        .load(conn)?;

    Ok(rows)
}
