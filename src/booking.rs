//! Stateroom availability engine: pricing, vacancy claim, and the atomic
//! invoice/booking/payment sequence. Package sales follow the same shape
//! without a vacancy flag.

use serde::Serialize;

use crate::errors::CoreError;
use crate::models::*;
use crate::store::Store;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Largest tolerated gap between the client-declared amount and the price
/// computed server-side.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

pub const CHARGE_PER_NIGHT: &str = "per night";
pub const CHARGE_PER_TRIP: &str = "per trip";

/// Billable nights for a trip. Truncating integer division: partial days
/// do not charge. A 23-hour trip prices as zero nights.
pub fn trip_length_nights(start_date: i64, end_date: i64) -> i64 {
    (end_date - start_date) / SECONDS_PER_DAY
}

pub fn stay_price(price_per_night: f64, nights: i64) -> f64 {
    price_per_night * nights as f64
}

#[derive(Debug, Serialize)]
pub struct StateroomQuote {
    pub trip_length_nights: i64,
    pub price_per_night: f64,
    pub total_price: f64,
    pub is_vacant: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingReceipt {
    pub booking_id: i32,
    pub invoice_id: i32,
    pub payment_id: i32,
    pub group_id: i32,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct PackageReceipt {
    pub pkg_sale_id: i32,
    pub invoice_id: i32,
    pub payment_id: i32,
    pub group_id: i32,
    pub amount: f64,
}

/// Prices a stay without touching anything. Read-only companion to
/// `book_stateroom`.
pub fn quote_stateroom<S: Store>(
    store: &mut S,
    trip_id: i32,
    stateroom_id: i32,
) -> Result<StateroomQuote, CoreError> {
    let trip = store
        .trip(trip_id)?
        .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", trip_id)))?;
    let price = store.stateroom_price(trip_id, stateroom_id)?.ok_or_else(|| {
        CoreError::NotFound(format!(
            "stateroom {} is not offered on trip {}",
            stateroom_id, trip_id
        ))
    })?;
    let nights = trip_length_nights(trip.start_date, trip.end_date);
    Ok(StateroomQuote {
        trip_length_nights: nights,
        price_per_night: price.price_per_night,
        total_price: stay_price(price.price_per_night, nights),
        is_vacant: price.is_vacant,
    })
}

/// Books a stateroom for a travel group.
///
/// The whole sequence runs in one store transaction: validate, claim the
/// price row via compare-and-set, then create Invoice, StateroomBooking and
/// Payment. Any failure rolls everything back, so a partial booking is
/// never observable. The CAS is what closes the race between two callers
/// that both read the row as vacant.
pub fn book_stateroom<S: Store>(
    store: &mut S,
    identity: &Identity,
    now: i64,
    req: &BookStateroomRequest,
) -> Result<BookingReceipt, CoreError> {
    if req.payment_method.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "payment method must not be empty".to_string(),
        ));
    }
    store.in_transaction(|s| {
        ensure_group_member(s, identity, req.group_id)?;
        let trip = s
            .trip(req.trip_id)?
            .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", req.trip_id)))?;
        let price = s.stateroom_price(req.trip_id, req.stateroom_id)?.ok_or_else(|| {
            CoreError::NotFound(format!(
                "stateroom {} is not offered on trip {}",
                req.stateroom_id, req.trip_id
            ))
        })?;
        if !s.group_exists(req.group_id)? {
            return Err(CoreError::NotFound(format!(
                "travel group {} not found",
                req.group_id
            )));
        }

        let nights = trip_length_nights(trip.start_date, trip.end_date);
        if nights <= 0 {
            return Err(CoreError::InvalidInput(
                "trip has no billable nights".to_string(),
            ));
        }
        if !price.is_vacant {
            return Err(CoreError::Conflict(
                "stateroom is no longer vacant for this trip".to_string(),
            ));
        }
        let amount = stay_price(price.price_per_night, nights);
        if (req.amount - amount).abs() > AMOUNT_TOLERANCE {
            return Err(CoreError::AmountMismatch {
                declared: req.amount,
                computed: amount,
            });
        }

        // The read above may be stale; the claim is authoritative.
        if !s.claim_stateroom(price.price_id)? {
            return Err(CoreError::Conflict(
                "stateroom is no longer vacant for this trip".to_string(),
            ));
        }

        let invoice_id = s.insert_invoice(&NewInvoice {
            payment_due: amount,
            billing_date_time: now,
        })?;
        let booking_id = s.insert_booking(&NewStateroomBooking {
            group_id: req.group_id,
            invoice_id,
            price_id: price.price_id,
        })?;
        let payment_id = s.insert_payment(&NewPayment {
            payment_date: now,
            pay_amount: amount,
            payment_method: req.payment_method.clone(),
            trip_id: req.trip_id,
            group_id: req.group_id,
            invoice_id,
        })?;

        Ok(BookingReceipt {
            booking_id,
            invoice_id,
            payment_id,
            group_id: req.group_id,
            amount,
        })
    })
}

/// Sells a package to a travel group: the stateroom-booking pattern minus
/// the vacancy flag. `per night` packages multiply by the trip length,
/// `per trip` packages charge once.
pub fn buy_package<S: Store>(
    store: &mut S,
    identity: &Identity,
    now: i64,
    req: &BuyPackageRequest,
) -> Result<PackageReceipt, CoreError> {
    if req.payment_method.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "payment method must not be empty".to_string(),
        ));
    }
    store.in_transaction(|s| {
        ensure_group_member(s, identity, req.group_id)?;
        let trip = s
            .trip(req.trip_id)?
            .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", req.trip_id)))?;
        let package = s
            .package(req.package_id)?
            .ok_or_else(|| CoreError::NotFound(format!("package {} not found", req.package_id)))?;
        if !s.group_exists(req.group_id)? {
            return Err(CoreError::NotFound(format!(
                "travel group {} not found",
                req.group_id
            )));
        }

        let amount = match package.pkg_charge_type.as_str() {
            CHARGE_PER_NIGHT => {
                let nights = trip_length_nights(trip.start_date, trip.end_date);
                if nights <= 0 {
                    return Err(CoreError::InvalidInput(
                        "trip has no billable nights".to_string(),
                    ));
                }
                package.pkg_price * nights as f64
            }
            CHARGE_PER_TRIP => package.pkg_price,
            other => {
                return Err(CoreError::Store(format!(
                    "package {} has unknown charge type '{}'",
                    package.package_id, other
                )))
            }
        };
        if (req.amount - amount).abs() > AMOUNT_TOLERANCE {
            return Err(CoreError::AmountMismatch {
                declared: req.amount,
                computed: amount,
            });
        }

        let invoice_id = s.insert_invoice(&NewInvoice {
            payment_due: amount,
            billing_date_time: now,
        })?;
        let pkg_sale_id = s.insert_package_sale(&NewPackageSale {
            package_id: req.package_id,
            group_id: req.group_id,
            invoice_id,
        })?;
        let payment_id = s.insert_payment(&NewPayment {
            payment_date: now,
            pay_amount: amount,
            payment_method: req.payment_method.clone(),
            trip_id: req.trip_id,
            group_id: req.group_id,
            invoice_id,
        })?;

        Ok(PackageReceipt {
            pkg_sale_id,
            invoice_id,
            payment_id,
            group_id: req.group_id,
            amount,
        })
    })
}

/// Admins may act for any group; passengers only for their own.
fn ensure_group_member<S: Store>(
    store: &mut S,
    identity: &Identity,
    group_id: i32,
) -> Result<(), CoreError> {
    if identity.is_admin() {
        return Ok(());
    }
    match store.passenger_for_user(identity.user_id)? {
        Some(p) if p.group_id == group_id => Ok(()),
        _ => Err(CoreError::Unauthorized(
            "bookings may only be made for your own travel group".to_string(),
        )),
    }
}
