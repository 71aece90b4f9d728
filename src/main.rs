use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use serde_json::json;
use log::{info, debug, error};
use std::env;

// Import types from the crate (lib.rs)
use seafare::models::{
    BookStateroomRequest, BuyPackageRequest, CreatePackageRequest, CreatePortRequest,
    CreateStateroomPriceRequest, CreateStateroomRequest, CreateTripRequest, Identity,
    LoginRequest, LoginResponse, PassengerUpdateRequest, RefreshRequest, RegistrationRequest,
    StopRequest,
};
use seafare::services::{
    AuthService, BookingService, CatalogService, ItineraryService, PassengerService, TripService,
};
use seafare::config::{AppConfig, DbPool};
use seafare::errors::ApiError;
use seafare::middleware::RequestLogger;
use seafare::logger::setup_logger;
use seafare::db;

#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[post("/register")]
async fn register(
    pool: web::Data<DbPool>,
    req: web::Json<RegistrationRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Registration attempt for username: {}", req.username);
    let outcome = PassengerService::register(&pool, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful!",
        "user_id": outcome.user_id,
        "passenger_id": outcome.passenger_id,
        "group_id": outcome.group_id
    })))
}

#[post("/login")]
async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Login attempt for user: {}", login_data.username);

    // Find user by username
    let user = match AuthService::find_by_username(&pool, &login_data.username).await? {
        Some(user) => user,
        None => {
            debug!("Login failed: no user named {}", login_data.username);
            return Err(ApiError::AuthError("Invalid username or password".to_string()));
        }
    };

    // Verify password
    let valid = AuthService::verify_password(&login_data.password, &user.password_hash)?;
    if !valid {
        debug!("Login failed: invalid password for {}", login_data.username);
        return Err(ApiError::AuthError("Invalid username or password".to_string()));
    }

    // Generate JWT and server-side refresh token
    let token = AuthService::generate_token(&user, &config)?;
    let refresh_token_value = AuthService::generate_refresh_token();
    AuthService::store_refresh_token(&pool, user.user_id, &refresh_token_value, &config).await?;

    info!("User {} logged in successfully", user.username);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        refresh_token: refresh_token_value,
        user_id: user.user_id,
        username: user.username,
        user_type: user.user_type,
    }))
}

#[post("/refresh-token")]
async fn refresh_token(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = match AuthService::rotate_refresh_token(&pool, &req.refresh_token).await? {
        Some(user) => user,
        None => {
            return Err(ApiError::AuthError(
                "Invalid or expired refresh token".to_string(),
            ))
        }
    };

    let token = AuthService::generate_token(&user, &config)?;
    let new_refresh_token = AuthService::generate_refresh_token();
    AuthService::store_refresh_token(&pool, user.user_id, &new_refresh_token, &config).await?;

    info!("Token refreshed for user {}", user.username);

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "refresh_token": new_refresh_token,
        "user_id": user.user_id,
        "username": user.username
    })))
}

#[post("/logout")]
async fn logout(
    pool: web::Data<DbPool>,
    _identity: Identity,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    AuthService::revoke_refresh_token(&pool, &req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully." })))
}

#[get("/passengers/{id}")]
async fn get_passenger(
    pool: web::Data<DbPool>,
    _identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let passenger = PassengerService::profile(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "passenger": passenger })))
}

#[put("/passengers/{id}")]
async fn edit_passenger(
    pool: web::Data<DbPool>,
    identity: Identity,
    path: web::Path<i32>,
    req: web::Json<PassengerUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    PassengerService::update(&pool, identity, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Your information has been updated successfully!"
    })))
}

#[get("/passengers/{id}/group")]
async fn get_group(
    pool: web::Data<DbPool>,
    _identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let group = PassengerService::group(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[get("/passengers/{id}/trips")]
async fn get_passenger_trips(
    pool: web::Data<DbPool>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let trips = PassengerService::trips(&pool, identity, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "trips": trips })))
}

#[get("/admin/passengers")]
async fn admin_list_passengers(
    pool: web::Data<DbPool>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    identity.require_admin()?;
    let passengers = PassengerService::list(&pool).await?;
    let passengers: Vec<_> = passengers
        .iter()
        .map(|p| {
            json!({
                "id": p.passenger_id,
                "first_name": p.first_name,
                "last_name": p.last_name,
                "phone": p.phone,
                "gender": p.gender,
                "nationality": p.nationality
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "passengers": passengers })))
}

#[delete("/admin/passengers/{id}")]
async fn admin_delete_passenger(
    pool: web::Data<DbPool>,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let passenger_id = path.into_inner();
    PassengerService::remove(&pool, identity, passenger_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Passenger with ID {} deleted successfully.", passenger_id)
    })))
}

#[post("/trips")]
async fn create_trip(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<CreateTripRequest>,
) -> Result<HttpResponse, ApiError> {
    let trip_id = TripService::create(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "trip_id": trip_id })))
}

#[get("/trips")]
async fn list_trips(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let trips = TripService::list(&pool).await?;
    debug!("Listed {} trips", trips.len());
    Ok(HttpResponse::Ok().json(json!({ "trips": trips })))
}

#[get("/trips/{id}/staterooms")]
async fn list_trip_staterooms(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let offers = TripService::offers(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "staterooms": offers })))
}

#[get("/trips/{id}/itinerary")]
async fn list_trip_itinerary(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let stops = TripService::stops(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "itinerary": stops })))
}

#[post("/trips/{id}/itinerary")]
async fn add_itinerary_stop(
    pool: web::Data<DbPool>,
    identity: Identity,
    path: web::Path<i32>,
    req: web::Json<StopRequest>,
) -> Result<HttpResponse, ApiError> {
    let stop_id =
        ItineraryService::add_stop(&pool, identity, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "itinerary_id": stop_id })))
}

#[put("/itinerary/{id}")]
async fn update_itinerary_stop(
    pool: web::Data<DbPool>,
    identity: Identity,
    path: web::Path<i32>,
    req: web::Json<StopRequest>,
) -> Result<HttpResponse, ApiError> {
    ItineraryService::update_stop(&pool, identity, path.into_inner(), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Itinerary stop updated." })))
}

#[get("/trips/{trip_id}/staterooms/{stateroom_id}/quote")]
async fn quote_stateroom(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ApiError> {
    let (trip_id, stateroom_id) = path.into_inner();
    let quote = BookingService::quote(&pool, trip_id, stateroom_id).await?;
    Ok(HttpResponse::Ok().json(quote))
}

#[post("/bookings")]
async fn book_stateroom(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<BookStateroomRequest>,
) -> Result<HttpResponse, ApiError> {
    let receipt = BookingService::book(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(receipt))
}

#[post("/package-sales")]
async fn buy_package(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<BuyPackageRequest>,
) -> Result<HttpResponse, ApiError> {
    let receipt = BookingService::buy_package(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(receipt))
}

#[post("/staterooms")]
async fn create_stateroom(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<CreateStateroomRequest>,
) -> Result<HttpResponse, ApiError> {
    let stateroom_id = CatalogService::create_stateroom(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "stateroom_id": stateroom_id })))
}

#[get("/staterooms")]
async fn list_staterooms(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let staterooms = CatalogService::list_staterooms(&pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "staterooms": staterooms })))
}

#[post("/stateroom-prices")]
async fn create_stateroom_price(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<CreateStateroomPriceRequest>,
) -> Result<HttpResponse, ApiError> {
    let price_id =
        CatalogService::create_stateroom_price(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "price_id": price_id })))
}

#[post("/packages")]
async fn create_package(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<CreatePackageRequest>,
) -> Result<HttpResponse, ApiError> {
    let package_id = CatalogService::create_package(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "package_id": package_id })))
}

#[get("/packages")]
async fn list_packages(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let packages = CatalogService::list_packages(&pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "packages": packages })))
}

#[post("/ports")]
async fn create_port(
    pool: web::Data<DbPool>,
    identity: Identity,
    req: web::Json<CreatePortRequest>,
) -> Result<HttpResponse, ApiError> {
    let port_id = CatalogService::create_port(&pool, identity, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "port_id": port_id })))
}

#[get("/ports")]
async fn list_ports(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let ports = CatalogService::list_ports(&pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "ports": ports })))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables and initialize logger
    dotenvy::dotenv().ok();
    setup_logger();

    // Get host and port from environment or use defaults
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a number");

    // Connecting to database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    info!("Connecting to database: {}", db_url);

    // Initialize database schema and seed the admin account
    let mut conn = PgConnection::establish(&db_url)
        .expect("Failed to establish connection for schema initialization");
    db::initialize_schema(&mut conn)
        .expect("Failed to execute database initialization script");
    db::ensure_admin_account(&mut conn);

    // Set up database connection pool
    let manager = ConnectionManager::<PgConnection>::new(db_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool");

    // Load and validate configuration
    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        panic!("Invalid configuration: {}", e);
    }

    info!("Starting HTTP server at http://{}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            // Enable request logger middleware
            .wrap(RequestLogger)
            // Register app data
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            // API routes
            .service(
                web::scope("/api")
                    .service(health_check)
                    .service(register)
                    .service(login)
                    .service(refresh_token)
                    .service(logout)
                    .service(get_passenger)
                    .service(edit_passenger)
                    .service(get_group)
                    .service(get_passenger_trips)
                    .service(admin_list_passengers)
                    .service(admin_delete_passenger)
                    .service(create_trip)
                    .service(list_trips)
                    .service(list_trip_staterooms)
                    .service(list_trip_itinerary)
                    .service(add_itinerary_stop)
                    .service(update_itinerary_stop)
                    .service(quote_stateroom)
                    .service(book_stateroom)
                    .service(buy_package)
                    .service(create_stateroom)
                    .service(list_staterooms)
                    .service(create_stateroom_price)
                    .service(create_package)
                    .service(list_packages)
                    .service(create_port)
                    .service(list_ports),
            )
    })
    .workers(2) // Specify number of workers
    .keep_alive(std::time::Duration::from_secs(75)) // Configure keep-alive
    .shutdown_timeout(30) // Graceful shutdown timeout in seconds
    .bind((host, port))?
    .run()
    .await
}
