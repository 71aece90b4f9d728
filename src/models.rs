use serde::{Deserialize, Serialize};
use diesel::prelude::*;

use crate::errors::CoreError;

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub user_type: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::user_account)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub user_type: String,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Address {
    pub addr_id: i32,
    pub street: String,
    pub addr_line_2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

/// Structural key of an address. Two addresses are the same row when every
/// field matches, with NULL comparing equal to NULL.
#[derive(Insertable, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::address)]
pub struct NewAddress {
    pub street: String,
    pub addr_line_2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Passenger {
    pub passenger_id: i32,
    pub user_id: i32,
    pub addr_id: i32,
    pub group_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: i64,
    pub gender: String,
    pub nationality: String,
    pub phone: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::passenger)]
pub struct NewPassenger {
    pub user_id: i32,
    pub addr_id: i32,
    pub group_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: i64,
    pub gender: String,
    pub nationality: String,
    pub phone: String,
}

/// The self-editable slice of a passenger record.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::passenger)]
pub struct PassengerContactUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub addr_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Port {
    pub port_id: i32,
    pub port_name: String,
    pub nearest_airport: Option<String>,
    pub num_parking_spots: i32,
    pub addr_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::port)]
pub struct NewPort {
    pub port_name: String,
    pub nearest_airport: Option<String>,
    pub num_parking_spots: i32,
    pub addr_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Trip {
    pub trip_id: i32,
    pub start_date: i64,
    pub end_date: i64,
    pub start_port_id: i32,
    pub end_port_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::trip)]
pub struct NewTrip {
    pub start_date: i64,
    pub end_date: i64,
    pub start_port_id: i32,
    pub end_port_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Itinerary {
    pub itinerary_id: i32,
    pub trip_id: i32,
    pub port_id: i32,
    pub arrival_time: i64,
    pub departure_time: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::itinerary)]
pub struct NewItinerary {
    pub trip_id: i32,
    pub port_id: i32,
    pub arrival_time: i64,
    pub departure_time: i64,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::itinerary)]
pub struct ItineraryUpdate {
    pub port_id: i32,
    pub arrival_time: i64,
    pub departure_time: i64,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Stateroom {
    pub stateroom_id: i32,
    pub stateroom_type: String,
    pub location: String,
    pub num_bed: i32,
    pub num_bathroom: i32,
    pub num_balcony: i32,
    pub size_sqft: f64,
    pub room_number: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stateroom)]
pub struct NewStateroom {
    pub stateroom_type: String,
    pub location: String,
    pub num_bed: i32,
    pub num_bathroom: i32,
    pub num_balcony: i32,
    pub size_sqft: f64,
    pub room_number: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct StateroomPrice {
    pub price_id: i32,
    pub stateroom_id: i32,
    pub trip_id: i32,
    pub price_per_night: f64,
    pub is_vacant: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stateroom_price)]
pub struct NewStateroomPrice {
    pub stateroom_id: i32,
    pub trip_id: i32,
    pub price_per_night: f64,
    pub is_vacant: bool,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct StateroomBooking {
    pub booking_id: i32,
    pub group_id: i32,
    pub invoice_id: i32,
    pub price_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stateroom_booking)]
pub struct NewStateroomBooking {
    pub group_id: i32,
    pub invoice_id: i32,
    pub price_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Invoice {
    pub invoice_id: i32,
    pub payment_due: f64,
    pub billing_date_time: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::invoice)]
pub struct NewInvoice {
    pub payment_due: f64,
    pub billing_date_time: i64,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Payment {
    pub payment_id: i32,
    pub payment_date: i64,
    pub pay_amount: f64,
    pub payment_method: String,
    pub trip_id: i32,
    pub group_id: i32,
    pub invoice_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::payment)]
pub struct NewPayment {
    pub payment_date: i64,
    pub pay_amount: f64,
    pub payment_method: String,
    pub trip_id: i32,
    pub group_id: i32,
    pub invoice_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Package {
    pub package_id: i32,
    pub pkg_name: String,
    pub pkg_charge_type: String,
    pub pkg_price: f64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::package)]
pub struct NewPackage {
    pub pkg_name: String,
    pub pkg_charge_type: String,
    pub pkg_price: f64,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct PackageSale {
    pub pkg_sale_id: i32,
    pub package_id: i32,
    pub group_id: i32,
    pub invoice_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::package_sale)]
pub struct NewPackageSale {
    pub package_id: i32,
    pub group_id: i32,
    pub invoice_id: i32,
}

#[derive(Queryable, Serialize, Clone, Debug)]
pub struct RefreshToken {
    pub token_id: i32,
    pub user_id: i32,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::refresh_token)]
pub struct NewRefreshToken {
    pub user_id: i32,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

// Identity

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Passenger,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Passenger => "passenger",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "passenger" => Some(Role::Passenger),
            _ => None,
        }
    }
}

/// The authenticated caller, resolved from the request's JWT and passed
/// explicitly into every core operation.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), CoreError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(
                "this operation requires an admin account".to_string(),
            ))
        }
    }

    /// Owner-or-admin check against the user that owns a resource.
    pub fn can_act_for(&self, owner_user_id: i32) -> bool {
        self.user_id == owner_user_id || self.is_admin()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,      // Subject (user_id)
    pub exp: usize,       // Expiration time
    pub iat: usize,       // Issued at
    pub user_id: i32,
    pub username: String,
    pub user_type: String,
}

// DTOs

#[derive(Deserialize, Debug)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,

    // Passenger details
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String, // YYYY-MM-DD
    pub gender: String,
    pub nationality: String,
    pub phone: String,
    pub group_id: Option<i32>,

    // Address
    pub street: String,
    pub addr_line_2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

impl RegistrationRequest {
    pub fn address(&self) -> NewAddress {
        NewAddress {
            street: self.street.clone(),
            addr_line_2: self.addr_line_2.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state_province: self.state_province.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user_id: i32,
    pub username: String,
    pub user_type: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
pub struct PassengerUpdateRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,

    // Replacement address, deduplicated against existing rows
    pub street: String,
    pub addr_line_2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

impl PassengerUpdateRequest {
    pub fn address(&self) -> NewAddress {
        NewAddress {
            street: self.street.clone(),
            addr_line_2: self.addr_line_2.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state_province: self.state_province.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CreateTripRequest {
    pub start_date: String,
    pub end_date: String,
    pub start_port_id: i32,
    pub end_port_id: i32,
}

#[derive(Deserialize, Debug)]
pub struct StopRequest {
    pub port_id: i32,
    pub arrival_time: String,   // YYYY-MM-DD HH:MM:SS
    pub departure_time: String, // YYYY-MM-DD HH:MM:SS
}

#[derive(Deserialize, Debug)]
pub struct BookStateroomRequest {
    pub trip_id: i32,
    pub stateroom_id: i32,
    pub group_id: i32,
    pub amount: f64,
    pub payment_method: String,
}

#[derive(Deserialize, Debug)]
pub struct BuyPackageRequest {
    pub trip_id: i32,
    pub package_id: i32,
    pub group_id: i32,
    pub amount: f64,
    pub payment_method: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateStateroomRequest {
    pub stateroom_type: String,
    pub location: String,
    pub num_bed: i32,
    pub num_bathroom: i32,
    pub num_balcony: i32,
    pub size_sqft: f64,
    pub room_number: i32,
}

#[derive(Deserialize, Debug)]
pub struct CreateStateroomPriceRequest {
    pub stateroom_id: i32,
    pub trip_id: i32,
    pub price_per_night: f64,
}

#[derive(Deserialize, Debug)]
pub struct CreatePackageRequest {
    pub pkg_name: String,
    pub pkg_charge_type: String,
    pub pkg_price: f64,
}

#[derive(Deserialize, Debug)]
pub struct CreatePortRequest {
    pub port_name: String,
    pub nearest_airport: Option<String>,
    pub num_parking_spots: i32,

    pub street: String,
    pub addr_line_2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

impl CreatePortRequest {
    pub fn address(&self) -> NewAddress {
        NewAddress {
            street: self.street.clone(),
            addr_line_2: self.addr_line_2.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state_province: self.state_province.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}
