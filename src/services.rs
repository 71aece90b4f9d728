use actix_web::web;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use diesel::pg::PgConnection;
use jsonwebtoken::{encode, EncodingKey, Header};
use log::{debug, error, info};
use serde::Serialize;
use uuid::Uuid;

use crate::accounts;
use crate::booking::{self, BookingReceipt, PackageReceipt, StateroomQuote, SECONDS_PER_DAY};
use crate::config::{AppConfig, DbPool};
use crate::errors::{ApiError, CoreError};
use crate::itinerary;
use crate::models::*;
use crate::store::Store;
use crate::timefmt;

/// Checks a pooled connection out and runs `f` on the actix blocking pool,
/// translating both failure layers into `ApiError`.
async fn with_store<T, F>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, CoreError> + Send + 'static,
{
    let mut conn = pool.get().map_err(|e| {
        error!("Failed to get database connection: {}", e);
        ApiError::DatabaseError(e.to_string())
    })?;

    web::block(move || f(&mut *conn))
        .await
        .map_err(|e| {
            error!("Database operation error: {}", e);
            ApiError::DatabaseError(e.to_string())
        })?
        .map_err(ApiError::from)
}

// View structs returned to the HTTP layer

#[derive(Serialize, Debug)]
pub struct AddressView {
    pub street: String,
    pub addr_line_2: String,
    pub neighborhood: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub country: String,
}

impl From<Address> for AddressView {
    fn from(a: Address) -> Self {
        AddressView {
            street: a.street,
            addr_line_2: a.addr_line_2.unwrap_or_default(),
            neighborhood: a.neighborhood.unwrap_or_default(),
            city: a.city,
            state_province: a.state_province,
            postal_code: a.postal_code,
            country: a.country,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PassengerView {
    pub passenger_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: String,
    pub nationality: String,
    pub phone: String,
    pub group_id: i32,
    pub address: AddressView,
}

#[derive(Serialize, Debug)]
pub struct GroupMemberView {
    pub passenger_id: i32,
    pub name: String,
}

#[derive(Serialize, Debug)]
pub struct GroupView {
    pub group_id: i32,
    pub group_members: Vec<GroupMemberView>,
}

#[derive(Serialize, Debug)]
pub struct TripView {
    pub trip_id: i32,
    pub start_date: String,
    pub end_date: String,
    pub start_port_id: i32,
    pub end_port_id: i32,
}

impl From<Trip> for TripView {
    fn from(t: Trip) -> Self {
        TripView {
            trip_id: t.trip_id,
            start_date: timefmt::format_date(t.start_date),
            end_date: timefmt::format_date(t.end_date),
            start_port_id: t.start_port_id,
            end_port_id: t.end_port_id,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct BookedTripView {
    #[serde(flatten)]
    pub trip: TripView,
    pub payment_amount: f64,
    pub payment_method: String,
    pub payment_date: String,
}

#[derive(Serialize, Debug)]
pub struct OfferView {
    pub price_id: i32,
    pub stateroom_id: i32,
    pub stateroom_type: String,
    pub location: String,
    pub room_number: i32,
    pub num_bed: i32,
    pub price_per_night: f64,
    pub is_vacant: bool,
}

#[derive(Serialize, Debug)]
pub struct StopView {
    pub itinerary_id: i32,
    pub port_id: i32,
    pub arrival_time: String,
    pub departure_time: String,
}

impl From<Itinerary> for StopView {
    fn from(stop: Itinerary) -> Self {
        StopView {
            itinerary_id: stop.itinerary_id,
            port_id: stop.port_id,
            arrival_time: timefmt::format_datetime(stop.arrival_time),
            departure_time: timefmt::format_datetime(stop.departure_time),
        }
    }
}

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST).map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalError("Failed to hash password".to_string())
        })
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        verify(password, hash).map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalError("Failed to verify password".to_string())
        })
    }

    pub fn generate_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = (now + chrono::Duration::hours(config.jwt_expiry)).timestamp() as usize;

        let claims = Claims {
            sub: user.user_id.to_string(),
            exp,
            iat,
            user_id: user.user_id,
            username: user.username.clone(),
            user_type: user.user_type.clone(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            ApiError::InternalError("Failed to generate token".to_string())
        })
    }

    pub fn generate_refresh_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn find_by_username(
        pool: &DbPool,
        username: &str,
    ) -> Result<Option<User>, ApiError> {
        let username = username.to_string();
        with_store(pool, move |store| store.user_by_username(&username)).await
    }

    pub async fn store_refresh_token(
        pool: &DbPool,
        user_id: i32,
        token: &str,
        config: &AppConfig,
    ) -> Result<(), ApiError> {
        let now = Utc::now().timestamp();
        let record = NewRefreshToken {
            user_id,
            token: token.to_string(),
            expires_at: now + config.refresh_expiry * SECONDS_PER_DAY,
            created_at: now,
        };
        with_store(pool, move |store| store.insert_refresh_token(&record)).await
    }

    /// Revokes a refresh token on logout. Unknown tokens are a no-op.
    pub async fn revoke_refresh_token(pool: &DbPool, token: &str) -> Result<(), ApiError> {
        let token = token.to_string();
        with_store(pool, move |store| store.delete_refresh_token(&token)).await
    }

    /// Validates and consumes a refresh token, returning the user it was
    /// issued for. `None` means the token is unknown or expired.
    pub async fn rotate_refresh_token(
        pool: &DbPool,
        token: &str,
    ) -> Result<Option<User>, ApiError> {
        let token = token.to_string();
        let now = Utc::now().timestamp();
        with_store(pool, move |store| {
            store.in_transaction(|s| {
                let record = match s.valid_refresh_token(&token, now)? {
                    Some(record) => record,
                    None => return Ok(None),
                };
                s.delete_refresh_token(&token)?;
                s.user(record.user_id)
            })
        })
        .await
    }
}

pub struct PassengerService;

impl PassengerService {
    pub async fn register(
        pool: &DbPool,
        req: RegistrationRequest,
    ) -> Result<accounts::RegistrationOutcome, ApiError> {
        if req.password.is_empty() {
            return Err(ApiError::ValidationError(
                "password must not be empty".to_string(),
            ));
        }
        if req.password != req.confirm_password {
            return Err(ApiError::ValidationError(
                "passwords do not match".to_string(),
            ));
        }
        let password_hash = AuthService::hash_password(&req.password)?;

        let outcome = with_store(pool, move |store| {
            accounts::register_passenger(store, &req, &password_hash)
        })
        .await?;
        info!(
            "Registered passenger {} (user {}, group {})",
            outcome.passenger_id, outcome.user_id, outcome.group_id
        );
        Ok(outcome)
    }

    pub async fn profile(pool: &DbPool, passenger_id: i32) -> Result<PassengerView, ApiError> {
        with_store(pool, move |store| {
            let passenger = store.passenger(passenger_id)?.ok_or_else(|| {
                CoreError::NotFound(format!("passenger {} not found", passenger_id))
            })?;
            let address = store.address(passenger.addr_id)?.ok_or_else(|| {
                CoreError::Store(format!(
                    "passenger {} references missing address {}",
                    passenger_id, passenger.addr_id
                ))
            })?;
            Ok(PassengerView {
                passenger_id: passenger.passenger_id,
                first_name: passenger.first_name,
                last_name: passenger.last_name,
                birth_date: timefmt::format_date(passenger.birth_date),
                gender: passenger.gender,
                nationality: passenger.nationality,
                phone: passenger.phone,
                group_id: passenger.group_id,
                address: address.into(),
            })
        })
        .await
    }

    pub async fn update(
        pool: &DbPool,
        identity: Identity,
        passenger_id: i32,
        req: PassengerUpdateRequest,
    ) -> Result<(), ApiError> {
        with_store(pool, move |store| {
            accounts::edit_passenger(store, &identity, passenger_id, &req)
        })
        .await?;
        info!("Passenger {} updated their information", passenger_id);
        Ok(())
    }

    pub async fn group(pool: &DbPool, passenger_id: i32) -> Result<GroupView, ApiError> {
        with_store(pool, move |store| {
            let passenger = store.passenger(passenger_id)?.ok_or_else(|| {
                CoreError::NotFound(format!("passenger {} not found", passenger_id))
            })?;
            let members = store.passengers_in_group(passenger.group_id)?;
            Ok(GroupView {
                group_id: passenger.group_id,
                group_members: members
                    .into_iter()
                    .map(|m| GroupMemberView {
                        passenger_id: m.passenger_id,
                        name: format!("{} {}", m.first_name, m.last_name),
                    })
                    .collect(),
            })
        })
        .await
    }

    pub async fn trips(
        pool: &DbPool,
        identity: Identity,
        passenger_id: i32,
    ) -> Result<Vec<BookedTripView>, ApiError> {
        with_store(pool, move |store| {
            let passenger = store.passenger(passenger_id)?.ok_or_else(|| {
                CoreError::NotFound(format!("passenger {} not found", passenger_id))
            })?;
            if !identity.can_act_for(passenger.user_id) {
                return Err(CoreError::Unauthorized(
                    "you may only view your own trips".to_string(),
                ));
            }
            let rows = store.trips_paid_by_group(passenger.group_id)?;
            Ok(rows
                .into_iter()
                .map(|(trip, payment)| BookedTripView {
                    trip: trip.into(),
                    payment_amount: payment.pay_amount,
                    payment_method: payment.payment_method,
                    payment_date: timefmt::format_datetime(payment.payment_date),
                })
                .collect())
        })
        .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Passenger>, ApiError> {
        with_store(pool, |store| store.list_passengers()).await
    }

    pub async fn remove(
        pool: &DbPool,
        identity: Identity,
        passenger_id: i32,
    ) -> Result<(), ApiError> {
        with_store(pool, move |store| {
            accounts::remove_passenger(store, &identity, passenger_id)
        })
        .await?;
        info!("Passenger {} deleted", passenger_id);
        Ok(())
    }
}

pub struct TripService;

impl TripService {
    pub async fn create(
        pool: &DbPool,
        identity: Identity,
        req: CreateTripRequest,
    ) -> Result<i32, ApiError> {
        let trip_id = with_store(pool, move |store| {
            itinerary::create_trip(store, &identity, &req)
        })
        .await?;
        info!("Created trip {}", trip_id);
        Ok(trip_id)
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<TripView>, ApiError> {
        let trips = with_store(pool, |store| store.list_trips()).await?;
        Ok(trips.into_iter().map(TripView::from).collect())
    }

    pub async fn offers(pool: &DbPool, trip_id: i32) -> Result<Vec<OfferView>, ApiError> {
        with_store(pool, move |store| {
            if store.trip(trip_id)?.is_none() {
                return Err(CoreError::NotFound(format!("trip {} not found", trip_id)));
            }
            let offers = store.offers_for_trip(trip_id)?;
            Ok(offers
                .into_iter()
                .map(|(price, room)| OfferView {
                    price_id: price.price_id,
                    stateroom_id: room.stateroom_id,
                    stateroom_type: room.stateroom_type,
                    location: room.location,
                    room_number: room.room_number,
                    num_bed: room.num_bed,
                    price_per_night: price.price_per_night,
                    is_vacant: price.is_vacant,
                })
                .collect())
        })
        .await
    }

    pub async fn stops(pool: &DbPool, trip_id: i32) -> Result<Vec<StopView>, ApiError> {
        with_store(pool, move |store| {
            if store.trip(trip_id)?.is_none() {
                return Err(CoreError::NotFound(format!("trip {} not found", trip_id)));
            }
            let stops = store.itineraries_for_trip(trip_id)?;
            Ok(stops.into_iter().map(StopView::from).collect())
        })
        .await
    }
}

pub struct ItineraryService;

impl ItineraryService {
    pub async fn add_stop(
        pool: &DbPool,
        identity: Identity,
        trip_id: i32,
        req: StopRequest,
    ) -> Result<i32, ApiError> {
        let stop_id = with_store(pool, move |store| {
            itinerary::add_stop(store, &identity, trip_id, &req)
        })
        .await?;
        info!("Added itinerary stop {} to trip {}", stop_id, trip_id);
        Ok(stop_id)
    }

    pub async fn update_stop(
        pool: &DbPool,
        identity: Identity,
        itinerary_id: i32,
        req: StopRequest,
    ) -> Result<(), ApiError> {
        with_store(pool, move |store| {
            itinerary::update_stop(store, &identity, itinerary_id, &req)
        })
        .await?;
        info!("Rescheduled itinerary stop {}", itinerary_id);
        Ok(())
    }
}

pub struct BookingService;

impl BookingService {
    pub async fn quote(
        pool: &DbPool,
        trip_id: i32,
        stateroom_id: i32,
    ) -> Result<StateroomQuote, ApiError> {
        with_store(pool, move |store| {
            booking::quote_stateroom(store, trip_id, stateroom_id)
        })
        .await
    }

    pub async fn book(
        pool: &DbPool,
        identity: Identity,
        req: BookStateroomRequest,
    ) -> Result<BookingReceipt, ApiError> {
        let now = Utc::now().timestamp();
        debug!(
            "Booking stateroom {} on trip {} for group {}",
            req.stateroom_id, req.trip_id, req.group_id
        );
        let receipt = with_store(pool, move |store| {
            booking::book_stateroom(store, &identity, now, &req)
        })
        .await?;
        info!(
            "Booked stateroom: booking {} invoice {} amount {:.2}",
            receipt.booking_id, receipt.invoice_id, receipt.amount
        );
        Ok(receipt)
    }

    pub async fn buy_package(
        pool: &DbPool,
        identity: Identity,
        req: BuyPackageRequest,
    ) -> Result<PackageReceipt, ApiError> {
        let now = Utc::now().timestamp();
        let receipt = with_store(pool, move |store| {
            booking::buy_package(store, &identity, now, &req)
        })
        .await?;
        info!(
            "Sold package: sale {} invoice {} amount {:.2}",
            receipt.pkg_sale_id, receipt.invoice_id, receipt.amount
        );
        Ok(receipt)
    }
}

pub struct CatalogService;

impl CatalogService {
    const LOCATIONS: &'static [&'static str] = &["forward", "aft", "left", "right"];

    pub async fn create_stateroom(
        pool: &DbPool,
        identity: Identity,
        req: CreateStateroomRequest,
    ) -> Result<i32, ApiError> {
        identity.require_admin()?;
        if !Self::LOCATIONS.contains(&req.location.as_str()) {
            return Err(ApiError::ValidationError(
                "location must be one of forward, aft, left, right".to_string(),
            ));
        }
        if req.num_bed < 0 || req.num_bathroom < 0 || req.num_balcony < 0 {
            return Err(ApiError::ValidationError(
                "bed, bathroom and balcony counts must not be negative".to_string(),
            ));
        }
        let room = NewStateroom {
            stateroom_type: req.stateroom_type,
            location: req.location,
            num_bed: req.num_bed,
            num_bathroom: req.num_bathroom,
            num_balcony: req.num_balcony,
            size_sqft: req.size_sqft,
            room_number: req.room_number,
        };
        let stateroom_id = with_store(pool, move |store| store.insert_stateroom(&room)).await?;
        info!("Created stateroom {}", stateroom_id);
        Ok(stateroom_id)
    }

    pub async fn list_staterooms(pool: &DbPool) -> Result<Vec<Stateroom>, ApiError> {
        with_store(pool, |store| store.list_staterooms()).await
    }

    pub async fn create_stateroom_price(
        pool: &DbPool,
        identity: Identity,
        req: CreateStateroomPriceRequest,
    ) -> Result<i32, ApiError> {
        identity.require_admin()?;
        if req.price_per_night < 0.0 {
            return Err(ApiError::ValidationError(
                "price_per_night must not be negative".to_string(),
            ));
        }
        let price_id = with_store(pool, move |store| {
            store.in_transaction(|s| {
                if s.trip(req.trip_id)?.is_none() {
                    return Err(CoreError::NotFound(format!(
                        "trip {} not found",
                        req.trip_id
                    )));
                }
                if !s.stateroom_exists(req.stateroom_id)? {
                    return Err(CoreError::NotFound(format!(
                        "stateroom {} not found",
                        req.stateroom_id
                    )));
                }
                if s.stateroom_price(req.trip_id, req.stateroom_id)?.is_some() {
                    return Err(CoreError::Conflict(format!(
                        "stateroom {} is already offered on trip {}",
                        req.stateroom_id, req.trip_id
                    )));
                }
                s.insert_stateroom_price(&NewStateroomPrice {
                    stateroom_id: req.stateroom_id,
                    trip_id: req.trip_id,
                    price_per_night: req.price_per_night,
                    is_vacant: true,
                })
            })
        })
        .await?;
        info!("Created stateroom price row {}", price_id);
        Ok(price_id)
    }

    pub async fn create_package(
        pool: &DbPool,
        identity: Identity,
        req: CreatePackageRequest,
    ) -> Result<i32, ApiError> {
        identity.require_admin()?;
        if req.pkg_charge_type != booking::CHARGE_PER_NIGHT
            && req.pkg_charge_type != booking::CHARGE_PER_TRIP
        {
            return Err(ApiError::ValidationError(
                "pkg_charge_type must be 'per night' or 'per trip'".to_string(),
            ));
        }
        if req.pkg_price < 0.0 {
            return Err(ApiError::ValidationError(
                "pkg_price must not be negative".to_string(),
            ));
        }
        let package = NewPackage {
            pkg_name: req.pkg_name,
            pkg_charge_type: req.pkg_charge_type,
            pkg_price: req.pkg_price,
        };
        let package_id = with_store(pool, move |store| store.insert_package(&package)).await?;
        info!("Created package {}", package_id);
        Ok(package_id)
    }

    pub async fn list_packages(pool: &DbPool) -> Result<Vec<Package>, ApiError> {
        with_store(pool, |store| store.list_packages()).await
    }

    pub async fn create_port(
        pool: &DbPool,
        identity: Identity,
        req: CreatePortRequest,
    ) -> Result<i32, ApiError> {
        identity.require_admin()?;
        if req.port_name.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "port_name must not be empty".to_string(),
            ));
        }
        if req.num_parking_spots < 0 {
            return Err(ApiError::ValidationError(
                "num_parking_spots must not be negative".to_string(),
            ));
        }
        let port_id = with_store(pool, move |store| {
            store.in_transaction(|s| {
                // Port addresses share rows with passenger addresses.
                let addr_id = accounts::find_or_create_address(s, &req.address())?;
                s.insert_port(&NewPort {
                    port_name: req.port_name.clone(),
                    nearest_airport: req.nearest_airport.clone(),
                    num_parking_spots: req.num_parking_spots,
                    addr_id,
                })
            })
        })
        .await?;
        info!("Created port {}", port_id);
        Ok(port_id)
    }

    pub async fn list_ports(pool: &DbPool) -> Result<Vec<Port>, ApiError> {
        with_store(pool, |store| store.list_ports()).await
    }
}
