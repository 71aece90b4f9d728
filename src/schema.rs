// Database schema definitions
diesel::table! {
    user_account (user_id) {
        user_id -> Int4,
        username -> Varchar,
        password_hash -> Varchar,
        email -> Varchar,
        user_type -> Varchar,
    }
}

diesel::table! {
    address (addr_id) {
        addr_id -> Int4,
        street -> Varchar,
        addr_line_2 -> Nullable<Varchar>,
        neighborhood -> Nullable<Varchar>,
        city -> Varchar,
        state_province -> Varchar,
        postal_code -> Varchar,
        country -> Varchar,
    }
}

diesel::table! {
    travel_group (group_id) {
        group_id -> Int4,
    }
}

diesel::table! {
    passenger (passenger_id) {
        passenger_id -> Int4,
        user_id -> Int4,
        addr_id -> Int4,
        group_id -> Int4,
        first_name -> Varchar,
        last_name -> Varchar,
        birth_date -> Int8,
        gender -> Varchar,
        nationality -> Varchar,
        phone -> Varchar,
    }
}

diesel::table! {
    port (port_id) {
        port_id -> Int4,
        port_name -> Varchar,
        nearest_airport -> Nullable<Varchar>,
        num_parking_spots -> Int4,
        addr_id -> Int4,
    }
}

diesel::table! {
    trip (trip_id) {
        trip_id -> Int4,
        start_date -> Int8,
        end_date -> Int8,
        start_port_id -> Int4,
        end_port_id -> Int4,
    }
}

diesel::table! {
    itinerary (itinerary_id) {
        itinerary_id -> Int4,
        trip_id -> Int4,
        port_id -> Int4,
        arrival_time -> Int8,
        departure_time -> Int8,
    }
}

diesel::table! {
    stateroom (stateroom_id) {
        stateroom_id -> Int4,
        stateroom_type -> Varchar,
        location -> Varchar,
        num_bed -> Int4,
        num_bathroom -> Int4,
        num_balcony -> Int4,
        size_sqft -> Float8,
        room_number -> Int4,
    }
}

diesel::table! {
    stateroom_price (price_id) {
        price_id -> Int4,
        stateroom_id -> Int4,
        trip_id -> Int4,
        price_per_night -> Float8,
        is_vacant -> Bool,
    }
}

diesel::table! {
    stateroom_booking (booking_id) {
        booking_id -> Int4,
        group_id -> Int4,
        invoice_id -> Int4,
        price_id -> Int4,
    }
}

diesel::table! {
    invoice (invoice_id) {
        invoice_id -> Int4,
        payment_due -> Float8,
        billing_date_time -> Int8,
    }
}

diesel::table! {
    payment (payment_id) {
        payment_id -> Int4,
        payment_date -> Int8,
        pay_amount -> Float8,
        payment_method -> Varchar,
        trip_id -> Int4,
        group_id -> Int4,
        invoice_id -> Int4,
    }
}

diesel::table! {
    package (package_id) {
        package_id -> Int4,
        pkg_name -> Varchar,
        pkg_charge_type -> Varchar,
        pkg_price -> Float8,
    }
}

diesel::table! {
    package_sale (pkg_sale_id) {
        pkg_sale_id -> Int4,
        package_id -> Int4,
        group_id -> Int4,
        invoice_id -> Int4,
    }
}

diesel::table! {
    refresh_token (token_id) {
        token_id -> Int4,
        user_id -> Int4,
        token -> Varchar,
        expires_at -> Int8,
        created_at -> Int8,
    }
}

diesel::joinable!(passenger -> user_account (user_id));
diesel::joinable!(passenger -> address (addr_id));
diesel::joinable!(passenger -> travel_group (group_id));
diesel::joinable!(port -> address (addr_id));
diesel::joinable!(itinerary -> trip (trip_id));
diesel::joinable!(itinerary -> port (port_id));
diesel::joinable!(stateroom_price -> stateroom (stateroom_id));
diesel::joinable!(stateroom_price -> trip (trip_id));
diesel::joinable!(stateroom_booking -> travel_group (group_id));
diesel::joinable!(stateroom_booking -> invoice (invoice_id));
diesel::joinable!(stateroom_booking -> stateroom_price (price_id));
diesel::joinable!(payment -> trip (trip_id));
diesel::joinable!(payment -> travel_group (group_id));
diesel::joinable!(payment -> invoice (invoice_id));
diesel::joinable!(package_sale -> package (package_id));
diesel::joinable!(package_sale -> travel_group (group_id));
diesel::joinable!(package_sale -> invoice (invoice_id));
diesel::joinable!(refresh_token -> user_account (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    user_account, address, travel_group, passenger, port,
    trip, itinerary, stateroom, stateroom_price, stateroom_booking,
    invoice, payment, package, package_sale, refresh_token,
);
