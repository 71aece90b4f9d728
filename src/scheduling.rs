//! Interval placement check shared by the itinerary scheduler.
//!
//! Intervals are half-open `[start, end)` over epoch seconds, so two stops
//! may touch at an endpoint without conflicting.

/// Returns true when `[new_start, new_end)` lies inside
/// `[bound_start, bound_end]` and overlaps none of the existing intervals.
pub fn fits_schedule(
    new_start: i64,
    new_end: i64,
    bound_start: i64,
    bound_end: i64,
    existing: &[(i64, i64)],
) -> bool {
    if new_start < bound_start {
        return false;
    }
    if new_end > bound_end {
        return false;
    }
    if new_end <= new_start {
        return false;
    }
    for &(start, end) in existing {
        if (new_start >= start && new_start < end) || (new_end > start && new_end <= end) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    #[test]
    fn accepts_first_interval_within_bounds() {
        assert!(fits_schedule(10, 20, 0, 100, &[]));
    }

    #[test]
    fn rejects_start_before_bound() {
        assert!(!fits_schedule(-1, 20, 0, 100, &[]));
    }

    #[test]
    fn rejects_end_after_bound() {
        assert!(!fits_schedule(10, 101, 0, 100, &[]));
    }

    #[test]
    fn rejects_empty_and_backward_intervals() {
        assert!(!fits_schedule(10, 10, 0, 100, &[]));
        assert!(!fits_schedule(20, 10, 0, 100, &[]));
    }

    #[test]
    fn accepts_back_to_back_intervals() {
        // 10:00-12:00 exists; 12:00-14:00 shares only the endpoint.
        let existing = [(10 * 3600, 12 * 3600)];
        assert!(fits_schedule(12 * 3600, 14 * 3600, 0, DAY, &existing));
        // And one ending exactly where the existing one starts.
        assert!(fits_schedule(8 * 3600, 10 * 3600, 0, DAY, &existing));
    }

    #[test]
    fn rejects_overlapping_intervals() {
        let existing = [(10 * 3600, 12 * 3600)];
        // 11:00-13:00 starts inside the existing stop.
        assert!(!fits_schedule(11 * 3600, 13 * 3600, 0, DAY, &existing));
        // 9:00-11:00 ends inside it.
        assert!(!fits_schedule(9 * 3600, 11 * 3600, 0, DAY, &existing));
        // Identical interval.
        assert!(!fits_schedule(10 * 3600, 12 * 3600, 0, DAY, &existing));
    }

    #[test]
    fn rejects_interval_inside_existing() {
        let existing = [(10 * 3600, 14 * 3600)];
        assert!(!fits_schedule(11 * 3600, 13 * 3600, 0, DAY, &existing));
    }

    #[test]
    fn bound_violation_wins_over_clear_schedule() {
        // No existing stops, but the interval leaves the trip window.
        assert!(!fits_schedule(DAY, 2 * DAY, 0, DAY, &[]));
    }

    #[test]
    fn checks_every_existing_interval() {
        let existing = [(0, 10), (20, 30), (40, 50)];
        assert!(fits_schedule(10, 20, 0, 100, &existing));
        assert!(fits_schedule(30, 40, 0, 100, &existing));
        assert!(!fits_schedule(25, 35, 0, 100, &existing));
        assert!(!fits_schedule(35, 45, 0, 100, &existing));
    }
}
