//! Trip creation and itinerary scheduling. Stops are placed against the
//! trip window and the trip's existing stops with the half-open interval
//! check from `scheduling`.

use crate::errors::CoreError;
use crate::models::*;
use crate::scheduling::fits_schedule;
use crate::store::Store;
use crate::timefmt;

pub fn create_trip<S: Store>(
    store: &mut S,
    identity: &Identity,
    req: &CreateTripRequest,
) -> Result<i32, CoreError> {
    identity.require_admin()?;
    let start_date = timefmt::parse_timestamp(&req.start_date)?;
    let end_date = timefmt::parse_timestamp(&req.end_date)?;
    if start_date >= end_date {
        return Err(CoreError::InvalidInput(
            "trip must end after it starts".to_string(),
        ));
    }
    store.in_transaction(|s| {
        for port_id in [req.start_port_id, req.end_port_id] {
            if !s.port_exists(port_id)? {
                return Err(CoreError::NotFound(format!("port {} not found", port_id)));
            }
        }
        s.insert_trip(&NewTrip {
            start_date,
            end_date,
            start_port_id: req.start_port_id,
            end_port_id: req.end_port_id,
        })
    })
}

/// Adds a port stop to a trip's itinerary.
pub fn add_stop<S: Store>(
    store: &mut S,
    identity: &Identity,
    trip_id: i32,
    req: &StopRequest,
) -> Result<i32, CoreError> {
    identity.require_admin()?;
    let arrival_time = timefmt::parse_timestamp(&req.arrival_time)?;
    let departure_time = timefmt::parse_timestamp(&req.departure_time)?;
    store.in_transaction(|s| {
        let trip = s
            .trip(trip_id)?
            .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", trip_id)))?;
        if !s.port_exists(req.port_id)? {
            return Err(CoreError::NotFound(format!("port {} not found", req.port_id)));
        }
        let existing: Vec<(i64, i64)> = s
            .itineraries_for_trip(trip_id)?
            .iter()
            .map(|stop| (stop.arrival_time, stop.departure_time))
            .collect();
        if !fits_schedule(
            arrival_time,
            departure_time,
            trip.start_date,
            trip.end_date,
            &existing,
        ) {
            return Err(CoreError::Conflict(
                "stop falls outside the trip window or overlaps another stop".to_string(),
            ));
        }
        s.insert_itinerary(&NewItinerary {
            trip_id,
            port_id: req.port_id,
            arrival_time,
            departure_time,
        })
    })
}

/// Reschedules an existing stop. The stop being edited is excluded from
/// the conflict set so it can move within or around its own slot.
pub fn update_stop<S: Store>(
    store: &mut S,
    identity: &Identity,
    itinerary_id: i32,
    req: &StopRequest,
) -> Result<(), CoreError> {
    identity.require_admin()?;
    let arrival_time = timefmt::parse_timestamp(&req.arrival_time)?;
    let departure_time = timefmt::parse_timestamp(&req.departure_time)?;
    store.in_transaction(|s| {
        let stop = s.itinerary(itinerary_id)?.ok_or_else(|| {
            CoreError::NotFound(format!("itinerary stop {} not found", itinerary_id))
        })?;
        let trip = s
            .trip(stop.trip_id)?
            .ok_or_else(|| CoreError::NotFound(format!("trip {} not found", stop.trip_id)))?;
        if !s.port_exists(req.port_id)? {
            return Err(CoreError::NotFound(format!("port {} not found", req.port_id)));
        }
        let existing: Vec<(i64, i64)> = s
            .itineraries_for_trip(stop.trip_id)?
            .iter()
            .filter(|other| other.itinerary_id != itinerary_id)
            .map(|other| (other.arrival_time, other.departure_time))
            .collect();
        if !fits_schedule(
            arrival_time,
            departure_time,
            trip.start_date,
            trip.end_date,
            &existing,
        ) {
            return Err(CoreError::Conflict(
                "stop falls outside the trip window or overlaps another stop".to_string(),
            ));
        }
        s.update_itinerary(
            itinerary_id,
            &ItineraryUpdate {
                port_id: req.port_id,
                arrival_time,
                departure_time,
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemStore;

    fn admin() -> Identity {
        Identity {
            user_id: 1,
            role: Role::Admin,
        }
    }

    fn passenger() -> Identity {
        Identity {
            user_id: 2,
            role: Role::Passenger,
        }
    }

    fn seed_port(store: &mut MemStore, name: &str) -> i32 {
        let addr_id = store
            .insert_address(&NewAddress {
                street: format!("1 {} Quay", name),
                addr_line_2: None,
                neighborhood: None,
                city: name.to_string(),
                state_province: "FL".to_string(),
                postal_code: "33101".to_string(),
                country: "USA".to_string(),
            })
            .unwrap();
        store
            .insert_port(&NewPort {
                port_name: name.to_string(),
                nearest_airport: Some(format!("{} Intl", name)),
                num_parking_spots: 200,
                addr_id,
            })
            .unwrap()
    }

    /// One port and a week-long trip starting 2030-06-01.
    fn seeded() -> (MemStore, i32, i32) {
        let mut store = MemStore::new();
        let port_id = seed_port(&mut store, "Miami");
        let trip_id = create_trip(
            &mut store,
            &admin(),
            &CreateTripRequest {
                start_date: "2030-06-01".to_string(),
                end_date: "2030-06-08".to_string(),
                start_port_id: port_id,
                end_port_id: port_id,
            },
        )
        .unwrap();
        (store, trip_id, port_id)
    }

    fn stop(port_id: i32, arrival: &str, departure: &str) -> StopRequest {
        StopRequest {
            port_id,
            arrival_time: arrival.to_string(),
            departure_time: departure.to_string(),
        }
    }

    #[test]
    fn create_trip_requires_admin() {
        let mut store = MemStore::new();
        let port_id = seed_port(&mut store, "Miami");
        let err = create_trip(
            &mut store,
            &passenger(),
            &CreateTripRequest {
                start_date: "2030-06-01".to_string(),
                end_date: "2030-06-08".to_string(),
                start_port_id: port_id,
                end_port_id: port_id,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[test]
    fn create_trip_rejects_backward_dates() {
        let mut store = MemStore::new();
        let port_id = seed_port(&mut store, "Miami");
        for (start, end) in [("2030-06-08", "2030-06-01"), ("2030-06-01", "2030-06-01")] {
            let err = create_trip(
                &mut store,
                &admin(),
                &CreateTripRequest {
                    start_date: start.to_string(),
                    end_date: end.to_string(),
                    start_port_id: port_id,
                    end_port_id: port_id,
                },
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput(_)));
        }
        assert!(store.trips.is_empty());
    }

    #[test]
    fn create_trip_requires_known_ports() {
        let mut store = MemStore::new();
        let port_id = seed_port(&mut store, "Miami");
        let err = create_trip(
            &mut store,
            &admin(),
            &CreateTripRequest {
                start_date: "2030-06-01".to_string(),
                end_date: "2030-06-08".to_string(),
                start_port_id: port_id,
                end_port_id: 404,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn back_to_back_stops_are_allowed() {
        let (mut store, trip_id, port_id) = seeded();
        add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00"),
        )
        .unwrap();
        // Departs exactly when the first stop ends.
        add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 18:00:00", "2030-06-03 06:00:00"),
        )
        .unwrap();
        assert_eq!(store.itineraries.len(), 2);
    }

    #[test]
    fn overlapping_stop_is_rejected_without_insert() {
        let (mut store, trip_id, port_id) = seeded();
        add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00"),
        )
        .unwrap();
        let err = add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 12:00:00", "2030-06-02 20:00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(store.itineraries.len(), 1);
    }

    #[test]
    fn stops_must_stay_inside_the_trip_window() {
        let (mut store, trip_id, port_id) = seeded();
        // Arrives before the trip starts.
        let err = add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-05-31 08:00:00", "2030-06-01 18:00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        // Leaves after the trip ends.
        let err = add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-07 08:00:00", "2030-06-08 08:00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(store.itineraries.is_empty());
    }

    #[test]
    fn add_stop_rejects_unknown_trip_port_and_bad_dates() {
        let (mut store, trip_id, port_id) = seeded();
        assert!(matches!(
            add_stop(
                &mut store,
                &admin(),
                404,
                &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00")
            ),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            add_stop(
                &mut store,
                &admin(),
                trip_id,
                &stop(404, "2030-06-02 08:00:00", "2030-06-02 18:00:00")
            ),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            add_stop(
                &mut store,
                &admin(),
                trip_id,
                &stop(port_id, "soon", "later")
            ),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn update_excludes_the_edited_stop_from_conflicts() {
        let (mut store, trip_id, port_id) = seeded();
        let stop_id = add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00"),
        )
        .unwrap();

        // Shifting by two hours overlaps the stop's own old slot, which must
        // not count as a conflict.
        update_stop(
            &mut store,
            &admin(),
            stop_id,
            &stop(port_id, "2030-06-02 10:00:00", "2030-06-02 20:00:00"),
        )
        .unwrap();
        assert_eq!(
            store.itineraries[0].arrival_time,
            timefmt::parse_timestamp("2030-06-02 10:00:00").unwrap()
        );
    }

    #[test]
    fn update_still_conflicts_with_other_stops() {
        let (mut store, trip_id, port_id) = seeded();
        add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00"),
        )
        .unwrap();
        let second = add_stop(
            &mut store,
            &admin(),
            trip_id,
            &stop(port_id, "2030-06-03 08:00:00", "2030-06-03 18:00:00"),
        )
        .unwrap();

        let err = update_stop(
            &mut store,
            &admin(),
            second,
            &stop(port_id, "2030-06-02 12:00:00", "2030-06-03 06:00:00"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        // The stop keeps its original slot.
        assert_eq!(
            store.itineraries[1].arrival_time,
            timefmt::parse_timestamp("2030-06-03 08:00:00").unwrap()
        );
    }

    #[test]
    fn update_requires_existing_stop_and_admin() {
        let (mut store, _, port_id) = seeded();
        assert!(matches!(
            update_stop(
                &mut store,
                &admin(),
                404,
                &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00")
            ),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            update_stop(
                &mut store,
                &passenger(),
                404,
                &stop(port_id, "2030-06-02 08:00:00", "2030-06-02 18:00:00")
            ),
            Err(CoreError::Unauthorized(_))
        ));
    }
}
