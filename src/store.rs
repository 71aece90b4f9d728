use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::errors::CoreError;
use crate::models::*;
use crate::schema;

/// Data-store seam for the booking core. Every core operation receives a
/// `&mut impl Store` instead of touching a global connection, and runs its
/// mutations inside `in_transaction` so a failure anywhere rolls back the
/// whole unit of work.
///
/// Implemented for `diesel::PgConnection` in production; the test suite
/// drives the same operations against an in-memory implementation.
pub trait Store {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>;

    // Users
    fn username_or_email_taken(&mut self, username: &str, email: &str) -> Result<bool, CoreError>;
    fn insert_user(&mut self, user: &NewUser) -> Result<i32, CoreError>;
    fn user(&mut self, id: i32) -> Result<Option<User>, CoreError>;
    fn user_by_username(&mut self, username: &str) -> Result<Option<User>, CoreError>;
    fn delete_user(&mut self, id: i32) -> Result<(), CoreError>;

    // Addresses
    fn address(&mut self, id: i32) -> Result<Option<Address>, CoreError>;
    fn find_address(&mut self, fields: &NewAddress) -> Result<Option<i32>, CoreError>;
    fn insert_address(&mut self, fields: &NewAddress) -> Result<i32, CoreError>;
    fn passengers_at_address(&mut self, id: i32) -> Result<i64, CoreError>;
    fn ports_at_address(&mut self, id: i32) -> Result<i64, CoreError>;
    fn delete_address(&mut self, id: i32) -> Result<(), CoreError>;

    // Travel groups
    fn allocate_group(&mut self) -> Result<i32, CoreError>;
    fn group_exists(&mut self, id: i32) -> Result<bool, CoreError>;

    // Passengers
    fn insert_passenger(&mut self, passenger: &NewPassenger) -> Result<i32, CoreError>;
    fn passenger(&mut self, id: i32) -> Result<Option<Passenger>, CoreError>;
    fn passenger_for_user(&mut self, user_id: i32) -> Result<Option<Passenger>, CoreError>;
    fn passengers_in_group(&mut self, group_id: i32) -> Result<Vec<Passenger>, CoreError>;
    fn list_passengers(&mut self) -> Result<Vec<Passenger>, CoreError>;
    fn update_passenger_contact(
        &mut self,
        id: i32,
        update: &PassengerContactUpdate,
    ) -> Result<(), CoreError>;
    fn delete_passenger(&mut self, id: i32) -> Result<(), CoreError>;

    // Ports
    fn insert_port(&mut self, port: &NewPort) -> Result<i32, CoreError>;
    fn port_exists(&mut self, id: i32) -> Result<bool, CoreError>;
    fn list_ports(&mut self) -> Result<Vec<Port>, CoreError>;

    // Trips
    fn insert_trip(&mut self, trip: &NewTrip) -> Result<i32, CoreError>;
    fn trip(&mut self, id: i32) -> Result<Option<Trip>, CoreError>;
    fn list_trips(&mut self) -> Result<Vec<Trip>, CoreError>;
    fn trips_paid_by_group(&mut self, group_id: i32) -> Result<Vec<(Trip, Payment)>, CoreError>;

    // Itinerary stops
    fn insert_itinerary(&mut self, stop: &NewItinerary) -> Result<i32, CoreError>;
    fn itinerary(&mut self, id: i32) -> Result<Option<Itinerary>, CoreError>;
    /// Stops for a trip, ordered by arrival time.
    fn itineraries_for_trip(&mut self, trip_id: i32) -> Result<Vec<Itinerary>, CoreError>;
    fn update_itinerary(&mut self, id: i32, update: &ItineraryUpdate) -> Result<(), CoreError>;

    // Staterooms and price rows
    fn insert_stateroom(&mut self, room: &NewStateroom) -> Result<i32, CoreError>;
    fn stateroom_exists(&mut self, id: i32) -> Result<bool, CoreError>;
    fn list_staterooms(&mut self) -> Result<Vec<Stateroom>, CoreError>;
    fn insert_stateroom_price(&mut self, price: &NewStateroomPrice) -> Result<i32, CoreError>;
    fn stateroom_price(
        &mut self,
        trip_id: i32,
        stateroom_id: i32,
    ) -> Result<Option<StateroomPrice>, CoreError>;
    fn offers_for_trip(
        &mut self,
        trip_id: i32,
    ) -> Result<Vec<(StateroomPrice, Stateroom)>, CoreError>;
    /// Compare-and-set on the vacancy flag: flips `is_vacant` to false only
    /// if it is still true, reporting whether a row was claimed. This is the
    /// guard that closes the double-booking race.
    fn claim_stateroom(&mut self, price_id: i32) -> Result<bool, CoreError>;

    // Billing
    fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<i32, CoreError>;
    fn insert_booking(&mut self, booking: &NewStateroomBooking) -> Result<i32, CoreError>;
    fn insert_payment(&mut self, payment: &NewPayment) -> Result<i32, CoreError>;

    // Packages
    fn package(&mut self, id: i32) -> Result<Option<Package>, CoreError>;
    fn list_packages(&mut self) -> Result<Vec<Package>, CoreError>;
    fn insert_package(&mut self, package: &NewPackage) -> Result<i32, CoreError>;
    fn insert_package_sale(&mut self, sale: &NewPackageSale) -> Result<i32, CoreError>;

    // Refresh tokens
    fn insert_refresh_token(&mut self, token: &NewRefreshToken) -> Result<(), CoreError>;
    fn valid_refresh_token(
        &mut self,
        token: &str,
        now: i64,
    ) -> Result<Option<RefreshToken>, CoreError>;
    fn delete_refresh_token(&mut self, token: &str) -> Result<(), CoreError>;
}

impl Store for PgConnection {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>,
    {
        Connection::transaction(self, f)
    }

    fn username_or_email_taken(&mut self, name: &str, addr: &str) -> Result<bool, CoreError> {
        use schema::user_account::dsl::*;
        let found = user_account
            .filter(username.eq(name).or(email.eq(addr)))
            .select(user_id)
            .first::<i32>(self)
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<i32, CoreError> {
        use schema::user_account::dsl::*;
        Ok(diesel::insert_into(user_account)
            .values(user)
            .returning(user_id)
            .get_result(self)?)
    }

    fn user(&mut self, id: i32) -> Result<Option<User>, CoreError> {
        use schema::user_account::dsl::*;
        Ok(user_account.find(id).first::<User>(self).optional()?)
    }

    fn user_by_username(&mut self, name: &str) -> Result<Option<User>, CoreError> {
        use schema::user_account::dsl::*;
        Ok(user_account
            .filter(username.eq(name))
            .first::<User>(self)
            .optional()?)
    }

    fn delete_user(&mut self, id: i32) -> Result<(), CoreError> {
        use schema::user_account::dsl::*;
        diesel::delete(user_account.find(id)).execute(self)?;
        Ok(())
    }

    fn address(&mut self, id: i32) -> Result<Option<Address>, CoreError> {
        use schema::address::dsl::*;
        Ok(address.find(id).first::<Address>(self).optional()?)
    }

    fn find_address(&mut self, fields: &NewAddress) -> Result<Option<i32>, CoreError> {
        use schema::address::dsl::*;
        // IS NOT DISTINCT FROM so that NULL line-2/neighborhood fields
        // compare equal to NULL.
        Ok(address
            .filter(street.eq(&fields.street))
            .filter(addr_line_2.is_not_distinct_from(fields.addr_line_2.clone()))
            .filter(neighborhood.is_not_distinct_from(fields.neighborhood.clone()))
            .filter(city.eq(&fields.city))
            .filter(state_province.eq(&fields.state_province))
            .filter(postal_code.eq(&fields.postal_code))
            .filter(country.eq(&fields.country))
            .select(addr_id)
            .first::<i32>(self)
            .optional()?)
    }

    fn insert_address(&mut self, fields: &NewAddress) -> Result<i32, CoreError> {
        use schema::address::dsl::*;
        Ok(diesel::insert_into(address)
            .values(fields)
            .returning(addr_id)
            .get_result(self)?)
    }

    fn passengers_at_address(&mut self, id: i32) -> Result<i64, CoreError> {
        use schema::passenger::dsl::*;
        Ok(passenger
            .filter(addr_id.eq(id))
            .count()
            .get_result::<i64>(self)?)
    }

    fn ports_at_address(&mut self, id: i32) -> Result<i64, CoreError> {
        use schema::port::dsl::*;
        Ok(port.filter(addr_id.eq(id)).count().get_result::<i64>(self)?)
    }

    fn delete_address(&mut self, id: i32) -> Result<(), CoreError> {
        use schema::address::dsl::*;
        diesel::delete(address.find(id)).execute(self)?;
        Ok(())
    }

    fn allocate_group(&mut self) -> Result<i32, CoreError> {
        use schema::travel_group::dsl::*;
        // Sequence-backed allocation; never a max-scan over existing ids.
        Ok(diesel::insert_into(travel_group)
            .default_values()
            .returning(group_id)
            .get_result(self)?)
    }

    fn group_exists(&mut self, id: i32) -> Result<bool, CoreError> {
        use schema::travel_group::dsl::*;
        let found = travel_group
            .find(id)
            .select(group_id)
            .first::<i32>(self)
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_passenger(&mut self, row: &NewPassenger) -> Result<i32, CoreError> {
        use schema::passenger::dsl::*;
        Ok(diesel::insert_into(passenger)
            .values(row)
            .returning(passenger_id)
            .get_result(self)?)
    }

    fn passenger(&mut self, id: i32) -> Result<Option<Passenger>, CoreError> {
        use schema::passenger::dsl::*;
        Ok(passenger.find(id).first::<Passenger>(self).optional()?)
    }

    fn passenger_for_user(&mut self, owner: i32) -> Result<Option<Passenger>, CoreError> {
        use schema::passenger::dsl::*;
        Ok(passenger
            .filter(user_id.eq(owner))
            .first::<Passenger>(self)
            .optional()?)
    }

    fn passengers_in_group(&mut self, group: i32) -> Result<Vec<Passenger>, CoreError> {
        use schema::passenger::dsl::*;
        Ok(passenger
            .filter(group_id.eq(group))
            .order(passenger_id.asc())
            .load::<Passenger>(self)?)
    }

    fn list_passengers(&mut self) -> Result<Vec<Passenger>, CoreError> {
        use schema::passenger::dsl::*;
        Ok(passenger.order(passenger_id.asc()).load::<Passenger>(self)?)
    }

    fn update_passenger_contact(
        &mut self,
        id: i32,
        update: &PassengerContactUpdate,
    ) -> Result<(), CoreError> {
        use schema::passenger::dsl::*;
        diesel::update(passenger.find(id)).set(update).execute(self)?;
        Ok(())
    }

    fn delete_passenger(&mut self, id: i32) -> Result<(), CoreError> {
        use schema::passenger::dsl::*;
        diesel::delete(passenger.find(id)).execute(self)?;
        Ok(())
    }

    fn insert_port(&mut self, row: &NewPort) -> Result<i32, CoreError> {
        use schema::port::dsl::*;
        Ok(diesel::insert_into(port)
            .values(row)
            .returning(port_id)
            .get_result(self)?)
    }

    fn port_exists(&mut self, id: i32) -> Result<bool, CoreError> {
        use schema::port::dsl::*;
        let found = port.find(id).select(port_id).first::<i32>(self).optional()?;
        Ok(found.is_some())
    }

    fn list_ports(&mut self) -> Result<Vec<Port>, CoreError> {
        use schema::port::dsl::*;
        Ok(port.order(port_id.asc()).load::<Port>(self)?)
    }

    fn insert_trip(&mut self, row: &NewTrip) -> Result<i32, CoreError> {
        use schema::trip::dsl::*;
        Ok(diesel::insert_into(trip)
            .values(row)
            .returning(trip_id)
            .get_result(self)?)
    }

    fn trip(&mut self, id: i32) -> Result<Option<Trip>, CoreError> {
        use schema::trip::dsl::*;
        Ok(trip.find(id).first::<Trip>(self).optional()?)
    }

    fn list_trips(&mut self) -> Result<Vec<Trip>, CoreError> {
        use schema::trip::dsl::*;
        Ok(trip.order(start_date.asc()).load::<Trip>(self)?)
    }

    fn trips_paid_by_group(&mut self, group: i32) -> Result<Vec<(Trip, Payment)>, CoreError> {
        use schema::{payment, trip};
        Ok(trip::table
            .inner_join(payment::table.on(payment::trip_id.eq(trip::trip_id)))
            .filter(payment::group_id.eq(group))
            .select((trip::all_columns, payment::all_columns))
            .order(trip::start_date.asc())
            .load::<(Trip, Payment)>(self)?)
    }

    fn insert_itinerary(&mut self, row: &NewItinerary) -> Result<i32, CoreError> {
        use schema::itinerary::dsl::*;
        Ok(diesel::insert_into(itinerary)
            .values(row)
            .returning(itinerary_id)
            .get_result(self)?)
    }

    fn itinerary(&mut self, id: i32) -> Result<Option<Itinerary>, CoreError> {
        use schema::itinerary::dsl::*;
        Ok(itinerary.find(id).first::<Itinerary>(self).optional()?)
    }

    fn itineraries_for_trip(&mut self, trip: i32) -> Result<Vec<Itinerary>, CoreError> {
        use schema::itinerary::dsl::*;
        Ok(itinerary
            .filter(trip_id.eq(trip))
            .order(arrival_time.asc())
            .load::<Itinerary>(self)?)
    }

    fn update_itinerary(&mut self, id: i32, update: &ItineraryUpdate) -> Result<(), CoreError> {
        use schema::itinerary::dsl::*;
        diesel::update(itinerary.find(id)).set(update).execute(self)?;
        Ok(())
    }

    fn insert_stateroom(&mut self, row: &NewStateroom) -> Result<i32, CoreError> {
        use schema::stateroom::dsl::*;
        Ok(diesel::insert_into(stateroom)
            .values(row)
            .returning(stateroom_id)
            .get_result(self)?)
    }

    fn stateroom_exists(&mut self, id: i32) -> Result<bool, CoreError> {
        use schema::stateroom::dsl::*;
        let found = stateroom
            .find(id)
            .select(stateroom_id)
            .first::<i32>(self)
            .optional()?;
        Ok(found.is_some())
    }

    fn list_staterooms(&mut self) -> Result<Vec<Stateroom>, CoreError> {
        use schema::stateroom::dsl::*;
        Ok(stateroom.order(room_number.asc()).load::<Stateroom>(self)?)
    }

    fn insert_stateroom_price(&mut self, row: &NewStateroomPrice) -> Result<i32, CoreError> {
        use schema::stateroom_price::dsl::*;
        Ok(diesel::insert_into(stateroom_price)
            .values(row)
            .returning(price_id)
            .get_result(self)?)
    }

    fn stateroom_price(
        &mut self,
        trip: i32,
        room: i32,
    ) -> Result<Option<StateroomPrice>, CoreError> {
        use schema::stateroom_price::dsl::*;
        Ok(stateroom_price
            .filter(trip_id.eq(trip))
            .filter(stateroom_id.eq(room))
            .first::<StateroomPrice>(self)
            .optional()?)
    }

    fn offers_for_trip(
        &mut self,
        trip: i32,
    ) -> Result<Vec<(StateroomPrice, Stateroom)>, CoreError> {
        use schema::{stateroom, stateroom_price};
        Ok(stateroom_price::table
            .inner_join(stateroom::table)
            .filter(stateroom_price::trip_id.eq(trip))
            .select((stateroom_price::all_columns, stateroom::all_columns))
            .order(stateroom::room_number.asc())
            .load::<(StateroomPrice, Stateroom)>(self)?)
    }

    fn claim_stateroom(&mut self, price: i32) -> Result<bool, CoreError> {
        use schema::stateroom_price::dsl::*;
        let claimed = diesel::update(
            stateroom_price
                .filter(price_id.eq(price))
                .filter(is_vacant.eq(true)),
        )
        .set(is_vacant.eq(false))
        .execute(self)?;
        Ok(claimed == 1)
    }

    fn insert_invoice(&mut self, row: &NewInvoice) -> Result<i32, CoreError> {
        use schema::invoice::dsl::*;
        Ok(diesel::insert_into(invoice)
            .values(row)
            .returning(invoice_id)
            .get_result(self)?)
    }

    fn insert_booking(&mut self, row: &NewStateroomBooking) -> Result<i32, CoreError> {
        use schema::stateroom_booking::dsl::*;
        Ok(diesel::insert_into(stateroom_booking)
            .values(row)
            .returning(booking_id)
            .get_result(self)?)
    }

    fn insert_payment(&mut self, row: &NewPayment) -> Result<i32, CoreError> {
        use schema::payment::dsl::*;
        Ok(diesel::insert_into(payment)
            .values(row)
            .returning(payment_id)
            .get_result(self)?)
    }

    fn package(&mut self, id: i32) -> Result<Option<Package>, CoreError> {
        use schema::package::dsl::*;
        Ok(package.find(id).first::<Package>(self).optional()?)
    }

    fn list_packages(&mut self) -> Result<Vec<Package>, CoreError> {
        use schema::package::dsl::*;
        Ok(package.order(package_id.asc()).load::<Package>(self)?)
    }

    fn insert_package(&mut self, row: &NewPackage) -> Result<i32, CoreError> {
        use schema::package::dsl::*;
        Ok(diesel::insert_into(package)
            .values(row)
            .returning(package_id)
            .get_result(self)?)
    }

    fn insert_package_sale(&mut self, row: &NewPackageSale) -> Result<i32, CoreError> {
        use schema::package_sale::dsl::*;
        Ok(diesel::insert_into(package_sale)
            .values(row)
            .returning(pkg_sale_id)
            .get_result(self)?)
    }

    fn insert_refresh_token(&mut self, row: &NewRefreshToken) -> Result<(), CoreError> {
        use schema::refresh_token::dsl::*;
        diesel::insert_into(refresh_token).values(row).execute(self)?;
        Ok(())
    }

    fn valid_refresh_token(
        &mut self,
        value: &str,
        now: i64,
    ) -> Result<Option<RefreshToken>, CoreError> {
        use schema::refresh_token::dsl::*;
        Ok(refresh_token
            .filter(token.eq(value))
            .filter(expires_at.gt(now))
            .first::<RefreshToken>(self)
            .optional()?)
    }

    fn delete_refresh_token(&mut self, value: &str) -> Result<(), CoreError> {
        use schema::refresh_token::dsl::*;
        diesel::delete(refresh_token.filter(token.eq(value))).execute(self)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory `Store` used by the engine tests. Transactions snapshot
    //! the whole state and restore it on error, mirroring rollback.

    use super::*;

    #[derive(Default, Clone)]
    pub struct MemStore {
        next_id: i32,
        pub users: Vec<User>,
        pub addresses: Vec<Address>,
        pub groups: Vec<i32>,
        pub passengers: Vec<Passenger>,
        pub ports: Vec<Port>,
        pub trips: Vec<Trip>,
        pub itineraries: Vec<Itinerary>,
        pub staterooms: Vec<Stateroom>,
        pub prices: Vec<StateroomPrice>,
        pub bookings: Vec<StateroomBooking>,
        pub invoices: Vec<Invoice>,
        pub payments: Vec<Payment>,
        pub packages: Vec<Package>,
        pub package_sales: Vec<PackageSale>,
        pub refresh_tokens: Vec<RefreshToken>,
        /// When set, `stateroom_price` reports rows as vacant regardless of
        /// the stored flag, simulating a stale read racing the claim.
        pub stale_vacancy_reads: bool,
        /// When set, payment inserts fail, exercising rollback.
        pub fail_payments: bool,
    }

    impl MemStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn next(&mut self) -> i32 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl Store for MemStore {
        fn in_transaction<T, F>(&mut self, f: F) -> Result<T, CoreError>
        where
            F: FnOnce(&mut Self) -> Result<T, CoreError>,
        {
            let snapshot = self.clone();
            match f(self) {
                Ok(value) => Ok(value),
                Err(e) => {
                    *self = snapshot;
                    Err(e)
                }
            }
        }

        fn username_or_email_taken(
            &mut self,
            username: &str,
            email: &str,
        ) -> Result<bool, CoreError> {
            Ok(self
                .users
                .iter()
                .any(|u| u.username == username || u.email == email))
        }

        fn insert_user(&mut self, user: &NewUser) -> Result<i32, CoreError> {
            let id = self.next();
            self.users.push(User {
                user_id: id,
                username: user.username.clone(),
                password_hash: user.password_hash.clone(),
                email: user.email.clone(),
                user_type: user.user_type.clone(),
            });
            Ok(id)
        }

        fn user(&mut self, id: i32) -> Result<Option<User>, CoreError> {
            Ok(self.users.iter().find(|u| u.user_id == id).cloned())
        }

        fn user_by_username(&mut self, username: &str) -> Result<Option<User>, CoreError> {
            Ok(self.users.iter().find(|u| u.username == username).cloned())
        }

        fn delete_user(&mut self, id: i32) -> Result<(), CoreError> {
            self.users.retain(|u| u.user_id != id);
            self.refresh_tokens.retain(|t| t.user_id != id);
            Ok(())
        }

        fn address(&mut self, id: i32) -> Result<Option<Address>, CoreError> {
            Ok(self.addresses.iter().find(|a| a.addr_id == id).cloned())
        }

        fn find_address(&mut self, fields: &NewAddress) -> Result<Option<i32>, CoreError> {
            Ok(self
                .addresses
                .iter()
                .find(|a| {
                    a.street == fields.street
                        && a.addr_line_2 == fields.addr_line_2
                        && a.neighborhood == fields.neighborhood
                        && a.city == fields.city
                        && a.state_province == fields.state_province
                        && a.postal_code == fields.postal_code
                        && a.country == fields.country
                })
                .map(|a| a.addr_id))
        }

        fn insert_address(&mut self, fields: &NewAddress) -> Result<i32, CoreError> {
            let id = self.next();
            self.addresses.push(Address {
                addr_id: id,
                street: fields.street.clone(),
                addr_line_2: fields.addr_line_2.clone(),
                neighborhood: fields.neighborhood.clone(),
                city: fields.city.clone(),
                state_province: fields.state_province.clone(),
                postal_code: fields.postal_code.clone(),
                country: fields.country.clone(),
            });
            Ok(id)
        }

        fn passengers_at_address(&mut self, id: i32) -> Result<i64, CoreError> {
            Ok(self.passengers.iter().filter(|p| p.addr_id == id).count() as i64)
        }

        fn ports_at_address(&mut self, id: i32) -> Result<i64, CoreError> {
            Ok(self.ports.iter().filter(|p| p.addr_id == id).count() as i64)
        }

        fn delete_address(&mut self, id: i32) -> Result<(), CoreError> {
            self.addresses.retain(|a| a.addr_id != id);
            Ok(())
        }

        fn allocate_group(&mut self) -> Result<i32, CoreError> {
            let id = self.next();
            self.groups.push(id);
            Ok(id)
        }

        fn group_exists(&mut self, id: i32) -> Result<bool, CoreError> {
            Ok(self.groups.contains(&id))
        }

        fn insert_passenger(&mut self, row: &NewPassenger) -> Result<i32, CoreError> {
            let id = self.next();
            self.passengers.push(Passenger {
                passenger_id: id,
                user_id: row.user_id,
                addr_id: row.addr_id,
                group_id: row.group_id,
                first_name: row.first_name.clone(),
                last_name: row.last_name.clone(),
                birth_date: row.birth_date,
                gender: row.gender.clone(),
                nationality: row.nationality.clone(),
                phone: row.phone.clone(),
            });
            Ok(id)
        }

        fn passenger(&mut self, id: i32) -> Result<Option<Passenger>, CoreError> {
            Ok(self
                .passengers
                .iter()
                .find(|p| p.passenger_id == id)
                .cloned())
        }

        fn passenger_for_user(&mut self, user_id: i32) -> Result<Option<Passenger>, CoreError> {
            Ok(self
                .passengers
                .iter()
                .find(|p| p.user_id == user_id)
                .cloned())
        }

        fn passengers_in_group(&mut self, group_id: i32) -> Result<Vec<Passenger>, CoreError> {
            Ok(self
                .passengers
                .iter()
                .filter(|p| p.group_id == group_id)
                .cloned()
                .collect())
        }

        fn list_passengers(&mut self) -> Result<Vec<Passenger>, CoreError> {
            Ok(self.passengers.clone())
        }

        fn update_passenger_contact(
            &mut self,
            id: i32,
            update: &PassengerContactUpdate,
        ) -> Result<(), CoreError> {
            if let Some(p) = self.passengers.iter_mut().find(|p| p.passenger_id == id) {
                p.first_name = update.first_name.clone();
                p.last_name = update.last_name.clone();
                p.phone = update.phone.clone();
                p.addr_id = update.addr_id;
            }
            Ok(())
        }

        fn delete_passenger(&mut self, id: i32) -> Result<(), CoreError> {
            self.passengers.retain(|p| p.passenger_id != id);
            Ok(())
        }

        fn insert_port(&mut self, row: &NewPort) -> Result<i32, CoreError> {
            let id = self.next();
            self.ports.push(Port {
                port_id: id,
                port_name: row.port_name.clone(),
                nearest_airport: row.nearest_airport.clone(),
                num_parking_spots: row.num_parking_spots,
                addr_id: row.addr_id,
            });
            Ok(id)
        }

        fn port_exists(&mut self, id: i32) -> Result<bool, CoreError> {
            Ok(self.ports.iter().any(|p| p.port_id == id))
        }

        fn list_ports(&mut self) -> Result<Vec<Port>, CoreError> {
            Ok(self.ports.clone())
        }

        fn insert_trip(&mut self, row: &NewTrip) -> Result<i32, CoreError> {
            let id = self.next();
            self.trips.push(Trip {
                trip_id: id,
                start_date: row.start_date,
                end_date: row.end_date,
                start_port_id: row.start_port_id,
                end_port_id: row.end_port_id,
            });
            Ok(id)
        }

        fn trip(&mut self, id: i32) -> Result<Option<Trip>, CoreError> {
            Ok(self.trips.iter().find(|t| t.trip_id == id).cloned())
        }

        fn list_trips(&mut self) -> Result<Vec<Trip>, CoreError> {
            Ok(self.trips.clone())
        }

        fn trips_paid_by_group(
            &mut self,
            group_id: i32,
        ) -> Result<Vec<(Trip, Payment)>, CoreError> {
            let mut rows = Vec::new();
            for payment in self.payments.iter().filter(|p| p.group_id == group_id) {
                if let Some(trip) = self.trips.iter().find(|t| t.trip_id == payment.trip_id) {
                    rows.push((trip.clone(), payment.clone()));
                }
            }
            Ok(rows)
        }

        fn insert_itinerary(&mut self, row: &NewItinerary) -> Result<i32, CoreError> {
            let id = self.next();
            self.itineraries.push(Itinerary {
                itinerary_id: id,
                trip_id: row.trip_id,
                port_id: row.port_id,
                arrival_time: row.arrival_time,
                departure_time: row.departure_time,
            });
            Ok(id)
        }

        fn itinerary(&mut self, id: i32) -> Result<Option<Itinerary>, CoreError> {
            Ok(self
                .itineraries
                .iter()
                .find(|i| i.itinerary_id == id)
                .cloned())
        }

        fn itineraries_for_trip(&mut self, trip_id: i32) -> Result<Vec<Itinerary>, CoreError> {
            let mut stops: Vec<Itinerary> = self
                .itineraries
                .iter()
                .filter(|i| i.trip_id == trip_id)
                .cloned()
                .collect();
            stops.sort_by_key(|i| i.arrival_time);
            Ok(stops)
        }

        fn update_itinerary(&mut self, id: i32, update: &ItineraryUpdate) -> Result<(), CoreError> {
            if let Some(stop) = self.itineraries.iter_mut().find(|i| i.itinerary_id == id) {
                stop.port_id = update.port_id;
                stop.arrival_time = update.arrival_time;
                stop.departure_time = update.departure_time;
            }
            Ok(())
        }

        fn insert_stateroom(&mut self, row: &NewStateroom) -> Result<i32, CoreError> {
            let id = self.next();
            self.staterooms.push(Stateroom {
                stateroom_id: id,
                stateroom_type: row.stateroom_type.clone(),
                location: row.location.clone(),
                num_bed: row.num_bed,
                num_bathroom: row.num_bathroom,
                num_balcony: row.num_balcony,
                size_sqft: row.size_sqft,
                room_number: row.room_number,
            });
            Ok(id)
        }

        fn stateroom_exists(&mut self, id: i32) -> Result<bool, CoreError> {
            Ok(self.staterooms.iter().any(|s| s.stateroom_id == id))
        }

        fn list_staterooms(&mut self) -> Result<Vec<Stateroom>, CoreError> {
            Ok(self.staterooms.clone())
        }

        fn insert_stateroom_price(&mut self, row: &NewStateroomPrice) -> Result<i32, CoreError> {
            let id = self.next();
            self.prices.push(StateroomPrice {
                price_id: id,
                stateroom_id: row.stateroom_id,
                trip_id: row.trip_id,
                price_per_night: row.price_per_night,
                is_vacant: row.is_vacant,
            });
            Ok(id)
        }

        fn stateroom_price(
            &mut self,
            trip_id: i32,
            stateroom_id: i32,
        ) -> Result<Option<StateroomPrice>, CoreError> {
            let stale = self.stale_vacancy_reads;
            Ok(self
                .prices
                .iter()
                .find(|p| p.trip_id == trip_id && p.stateroom_id == stateroom_id)
                .cloned()
                .map(|mut p| {
                    if stale {
                        p.is_vacant = true;
                    }
                    p
                }))
        }

        fn offers_for_trip(
            &mut self,
            trip_id: i32,
        ) -> Result<Vec<(StateroomPrice, Stateroom)>, CoreError> {
            let mut rows = Vec::new();
            for price in self.prices.iter().filter(|p| p.trip_id == trip_id) {
                if let Some(room) = self
                    .staterooms
                    .iter()
                    .find(|s| s.stateroom_id == price.stateroom_id)
                {
                    rows.push((price.clone(), room.clone()));
                }
            }
            Ok(rows)
        }

        fn claim_stateroom(&mut self, price_id: i32) -> Result<bool, CoreError> {
            match self
                .prices
                .iter_mut()
                .find(|p| p.price_id == price_id && p.is_vacant)
            {
                Some(p) => {
                    p.is_vacant = false;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn insert_invoice(&mut self, row: &NewInvoice) -> Result<i32, CoreError> {
            let id = self.next();
            self.invoices.push(Invoice {
                invoice_id: id,
                payment_due: row.payment_due,
                billing_date_time: row.billing_date_time,
            });
            Ok(id)
        }

        fn insert_booking(&mut self, row: &NewStateroomBooking) -> Result<i32, CoreError> {
            let id = self.next();
            self.bookings.push(StateroomBooking {
                booking_id: id,
                group_id: row.group_id,
                invoice_id: row.invoice_id,
                price_id: row.price_id,
            });
            Ok(id)
        }

        fn insert_payment(&mut self, row: &NewPayment) -> Result<i32, CoreError> {
            if self.fail_payments {
                return Err(CoreError::Store("payment insert failed".to_string()));
            }
            let id = self.next();
            self.payments.push(Payment {
                payment_id: id,
                payment_date: row.payment_date,
                pay_amount: row.pay_amount,
                payment_method: row.payment_method.clone(),
                trip_id: row.trip_id,
                group_id: row.group_id,
                invoice_id: row.invoice_id,
            });
            Ok(id)
        }

        fn package(&mut self, id: i32) -> Result<Option<Package>, CoreError> {
            Ok(self.packages.iter().find(|p| p.package_id == id).cloned())
        }

        fn list_packages(&mut self) -> Result<Vec<Package>, CoreError> {
            Ok(self.packages.clone())
        }

        fn insert_package(&mut self, row: &NewPackage) -> Result<i32, CoreError> {
            let id = self.next();
            self.packages.push(Package {
                package_id: id,
                pkg_name: row.pkg_name.clone(),
                pkg_charge_type: row.pkg_charge_type.clone(),
                pkg_price: row.pkg_price,
            });
            Ok(id)
        }

        fn insert_package_sale(&mut self, row: &NewPackageSale) -> Result<i32, CoreError> {
            let id = self.next();
            self.package_sales.push(PackageSale {
                pkg_sale_id: id,
                package_id: row.package_id,
                group_id: row.group_id,
                invoice_id: row.invoice_id,
            });
            Ok(id)
        }

        fn insert_refresh_token(&mut self, row: &NewRefreshToken) -> Result<(), CoreError> {
            let id = self.next();
            self.refresh_tokens.push(RefreshToken {
                token_id: id,
                user_id: row.user_id,
                token: row.token.clone(),
                expires_at: row.expires_at,
                created_at: row.created_at,
            });
            Ok(())
        }

        fn valid_refresh_token(
            &mut self,
            token: &str,
            now: i64,
        ) -> Result<Option<RefreshToken>, CoreError> {
            Ok(self
                .refresh_tokens
                .iter()
                .find(|t| t.token == token && t.expires_at > now)
                .cloned())
        }

        fn delete_refresh_token(&mut self, token: &str) -> Result<(), CoreError> {
            self.refresh_tokens.retain(|t| t.token != token);
            Ok(())
        }
    }
}
