use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::{info, warn};
use std::env;

use crate::models::NewUser;

// Database initialization SQL
pub const DB_INIT_SQL: &str = r#"
-- Create tables if they don't exist
CREATE TABLE IF NOT EXISTS user_account (
    user_id SERIAL PRIMARY KEY,
    username VARCHAR(100) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    user_type VARCHAR(20) NOT NULL CHECK (user_type IN ('admin', 'passenger'))
);

CREATE TABLE IF NOT EXISTS address (
    addr_id SERIAL PRIMARY KEY,
    street VARCHAR(255) NOT NULL,
    addr_line_2 VARCHAR(255),
    neighborhood VARCHAR(255),
    city VARCHAR(100) NOT NULL,
    state_province VARCHAR(100) NOT NULL,
    postal_code VARCHAR(20) NOT NULL,
    country VARCHAR(100) NOT NULL
);

CREATE TABLE IF NOT EXISTS travel_group (
    group_id SERIAL PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS passenger (
    passenger_id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL UNIQUE REFERENCES user_account(user_id) ON DELETE CASCADE,
    addr_id INTEGER NOT NULL REFERENCES address(addr_id),
    group_id INTEGER NOT NULL REFERENCES travel_group(group_id),
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    birth_date BIGINT NOT NULL,
    gender VARCHAR(10) NOT NULL CHECK (gender IN ('female', 'male', 'other')),
    nationality VARCHAR(100) NOT NULL,
    phone VARCHAR(50) NOT NULL
);

CREATE TABLE IF NOT EXISTS port (
    port_id SERIAL PRIMARY KEY,
    port_name VARCHAR(100) NOT NULL,
    nearest_airport VARCHAR(100),
    num_parking_spots INTEGER NOT NULL CHECK (num_parking_spots >= 0),
    addr_id INTEGER NOT NULL REFERENCES address(addr_id)
);

CREATE TABLE IF NOT EXISTS trip (
    trip_id SERIAL PRIMARY KEY,
    start_date BIGINT NOT NULL,
    end_date BIGINT NOT NULL,
    start_port_id INTEGER NOT NULL REFERENCES port(port_id),
    end_port_id INTEGER NOT NULL REFERENCES port(port_id),
    CHECK (start_date < end_date)
);

CREATE TABLE IF NOT EXISTS itinerary (
    itinerary_id SERIAL PRIMARY KEY,
    trip_id INTEGER NOT NULL REFERENCES trip(trip_id) ON DELETE CASCADE,
    port_id INTEGER NOT NULL REFERENCES port(port_id),
    arrival_time BIGINT NOT NULL,
    departure_time BIGINT NOT NULL,
    CHECK (arrival_time < departure_time)
);

CREATE TABLE IF NOT EXISTS stateroom (
    stateroom_id SERIAL PRIMARY KEY,
    stateroom_type VARCHAR(100) NOT NULL,
    location VARCHAR(20) NOT NULL CHECK (location IN ('forward', 'aft', 'left', 'right')),
    num_bed INTEGER NOT NULL CHECK (num_bed >= 0),
    num_bathroom INTEGER NOT NULL CHECK (num_bathroom >= 0),
    num_balcony INTEGER NOT NULL CHECK (num_balcony >= 0),
    size_sqft DOUBLE PRECISION NOT NULL,
    room_number INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS stateroom_price (
    price_id SERIAL PRIMARY KEY,
    stateroom_id INTEGER NOT NULL REFERENCES stateroom(stateroom_id),
    trip_id INTEGER NOT NULL REFERENCES trip(trip_id) ON DELETE CASCADE,
    price_per_night DOUBLE PRECISION NOT NULL,
    is_vacant BOOLEAN NOT NULL DEFAULT TRUE,
    UNIQUE (stateroom_id, trip_id)
);

CREATE TABLE IF NOT EXISTS invoice (
    invoice_id SERIAL PRIMARY KEY,
    payment_due DOUBLE PRECISION NOT NULL,
    billing_date_time BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS stateroom_booking (
    booking_id SERIAL PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES travel_group(group_id),
    invoice_id INTEGER NOT NULL REFERENCES invoice(invoice_id),
    price_id INTEGER NOT NULL REFERENCES stateroom_price(price_id)
);

CREATE TABLE IF NOT EXISTS payment (
    payment_id SERIAL PRIMARY KEY,
    payment_date BIGINT NOT NULL,
    pay_amount DOUBLE PRECISION NOT NULL,
    payment_method VARCHAR(50) NOT NULL,
    trip_id INTEGER NOT NULL REFERENCES trip(trip_id),
    group_id INTEGER NOT NULL REFERENCES travel_group(group_id),
    invoice_id INTEGER NOT NULL REFERENCES invoice(invoice_id)
);

CREATE TABLE IF NOT EXISTS package (
    package_id SERIAL PRIMARY KEY,
    pkg_name VARCHAR(100) NOT NULL,
    pkg_charge_type VARCHAR(20) NOT NULL CHECK (pkg_charge_type IN ('per night', 'per trip')),
    pkg_price DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS package_sale (
    pkg_sale_id SERIAL PRIMARY KEY,
    package_id INTEGER NOT NULL REFERENCES package(package_id),
    group_id INTEGER NOT NULL REFERENCES travel_group(group_id),
    invoice_id INTEGER NOT NULL REFERENCES invoice(invoice_id)
);

CREATE TABLE IF NOT EXISTS refresh_token (
    token_id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES user_account(user_id) ON DELETE CASCADE,
    token VARCHAR(255) NOT NULL,
    expires_at BIGINT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_itinerary_trip ON itinerary(trip_id);
CREATE INDEX IF NOT EXISTS idx_passenger_addr ON passenger(addr_id);
CREATE INDEX IF NOT EXISTS idx_payment_group ON payment(group_id);
CREATE INDEX IF NOT EXISTS idx_refresh_token_token ON refresh_token(token);
"#;

/// Runs the idempotent schema bootstrap against a fresh connection.
pub fn initialize_schema(conn: &mut PgConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute(DB_INIT_SQL)?;
    info!("Database initialization complete.");
    Ok(())
}

/// Seeds the admin account from ADMIN_USERNAME / ADMIN_EMAIL /
/// ADMIN_PASSWORD when configured and not already present. Admin accounts
/// are never created through the public registration flow.
pub fn ensure_admin_account(conn: &mut PgConnection) {
    let (admin_user, admin_email, admin_password) = match (
        env::var("ADMIN_USERNAME"),
        env::var("ADMIN_EMAIL"),
        env::var("ADMIN_PASSWORD"),
    ) {
        (Ok(u), Ok(e), Ok(p)) => (u, e, p),
        _ => {
            info!("Admin bootstrap skipped (ADMIN_USERNAME/ADMIN_EMAIL/ADMIN_PASSWORD not set)");
            return;
        }
    };

    use crate::schema::user_account::dsl::*;
    let existing = user_account
        .filter(username.eq(&admin_user))
        .select(user_id)
        .first::<i32>(conn)
        .optional();

    match existing {
        Ok(Some(_)) => {}
        Ok(None) => {
            let hash = match bcrypt::hash(&admin_password, bcrypt::DEFAULT_COST) {
                Ok(h) => h,
                Err(e) => {
                    warn!("Failed to hash admin password: {}", e);
                    return;
                }
            };
            let admin = NewUser {
                username: admin_user.clone(),
                password_hash: hash,
                email: admin_email,
                user_type: "admin".to_string(),
            };
            match diesel::insert_into(user_account).values(&admin).execute(conn) {
                Ok(_) => info!("Seeded admin account '{}'", admin_user),
                Err(e) => warn!("Failed to seed admin account: {}", e),
            }
        }
        Err(e) => warn!("Failed to check for admin account: {}", e),
    }
}
