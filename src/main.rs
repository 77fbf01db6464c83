#[macro_use]
extern crate diesel;

use actix_web::{error, get, http::header, middleware, post, web, App, HttpResponse, HttpServer, Responder};
use diesel::{prelude::*, r2d2};
mod actions;
mod auth;
mod config;
mod errors;
mod models;
mod schema;
mod validation;

use auth::AuthenticatedUser;

type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

const MY_BOOKINGS_PATH: &str = "/my-bookings";

#[get("/travel-options")]
async fn list_travel_options(
    pool: web::Data<DbPool>,
    query: web::Query<models::TravelOptionQuery>
) -> actix_web::Result<impl Responder> {
    let filter = validation::TravelFilter::from_query(&query)?;

    let options = web::block(move || {
        let mut conn = pool.get()?;
        actions::list_travel_options(&mut conn, &filter)
    })
    .await??;

    let views: Vec<models::TravelOptionView> = options.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[get("/travel/{travel_id}")]
async fn travel_detail(
    pool: web::Data<DbPool>,
    path: web::Path<i32>
) -> actix_web::Result<impl Responder> {
    let travel_id = path.into_inner();

    let option = web::block(move || {
        let mut conn = pool.get()?;
        actions::get_travel_option(&mut conn, travel_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(models::TravelOptionView::from(option)))
}

#[post("/book/{travel_id}")]
async fn book_travel(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    form: web::Form<models::BookingForm>
) -> actix_web::Result<impl Responder> {
    let travel_id = path.into_inner();
    let seats = validation::validate_seat_count(form.seats)?;

    let booking = web::block(move || {
        let mut conn = pool.get()?;
        actions::create_booking(&mut conn, travel_id, &user, seats)
    })
    .await??;

    log::info!(
        "{} reserved {} seat(s) on travel option {} for {}",
        booking, booking.number_of_seats, travel_id, booking.total_price
    );

    Ok(redirect_to_bookings(models::BookingResponse {
        message: format!("Booking confirmed! Booking ID: {}", booking.booking_id),
        booking,
    }))
}

#[get("/my-bookings")]
async fn my_bookings(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser
) -> actix_web::Result<impl Responder> {
    let rows = web::block(move || {
        let mut conn = pool.get()?;
        actions::list_user_bookings(&mut conn, &user)
    })
    .await??;

    let bookings: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(booking, option)| {
            serde_json::json!({
                "booking_id": booking.booking_id,
                "number_of_seats": booking.number_of_seats,
                "total_price": booking.total_price,
                "booking_date": booking.booking_date,
                "status": booking.status,
                "travel_option": {
                    "travel_id": option.travel_id,
                    "type": option.travel_type,
                    "source": option.source,
                    "destination": option.destination,
                    "date_time": option.date_time,
                }
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(bookings))
}

#[post("/cancel-booking/{booking_id}")]
async fn cancel_booking(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    path: web::Path<i32>
) -> actix_web::Result<impl Responder> {
    let booking_id = path.into_inner();

    let booking = web::block(move || {
        let mut conn = pool.get()?;
        actions::cancel_booking(&mut conn, booking_id, &user)
    })
    .await??;

    log::info!(
        "{} cancelled, {} seat(s) returned to travel option {}",
        booking, booking.number_of_seats, booking.travel_id
    );

    Ok(redirect_to_bookings(models::BookingResponse {
        message: "Booking cancelled successfully!".to_string(),
        booking,
    }))
}

fn redirect_to_bookings(body: models::BookingResponse) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, MY_BOOKINGS_PATH))
        .json(body)
}

fn bad_request(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(models::ApiResponse { message: err.to_string() })
}

/// Routes and extractor settings shared by the server and the handler tests.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        let response = bad_request(&err);
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(&err);
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = bad_request(&err);
        error::InternalError::from_response(err, response).into()
    }))
    .service(list_travel_options)
    .service(travel_detail)
    .service(book_travel)
    .service(my_bookings)
    .service(cancel_booking);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = initialize_db_pool(&config)?;

    log::info!("starting HTTP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn initialize_db_pool(config: &config::Config) -> std::io::Result<DbPool> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(&config.database_url);
    r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
        .map_err(|e| {
            log::error!("Failed to create database pool: {:?}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })
}
