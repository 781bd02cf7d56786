//! Election lifecycle resolution. Pure functions of an election's window and
//! the current time.

use chrono::{DateTime, Utc};

use crate::model::{
    common::Phase,
    db::election::{Election, ElectionCore},
};

/// The phase of `election` at instant `now`. Both ends of the voting window
/// are inclusive.
pub fn phase(election: &ElectionCore, now: DateTime<Utc>) -> Phase {
    match &election.config {
        None => Phase::Unconfigured,
        Some(config) if now < config.start_time => Phase::Upcoming,
        Some(config) if now > config.end_time => Phase::Completed,
        Some(_) => Phase::Active,
    }
}

/// Order elections for the dashboard: active, then upcoming, then completed,
/// then unconfigured. Elections in the same phase keep their storage order.
pub fn order_for_display(mut elections: Vec<Election>, now: DateTime<Utc>) -> Vec<Election> {
    elections.sort_by_key(|election| phase(election, now).display_rank());
    elections
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::model::{db::election::ElectionConfig, mongodb::Id};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap(),
        )
    }

    fn election_with_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Election {
        let config = ElectionConfig::new("Board".to_string(), start, end).unwrap();
        Election::new(Id::new(), ElectionCore::configured(config))
    }

    #[test]
    fn unconfigured_without_window() {
        let election = ElectionCore::placeholder();
        assert_eq!(phase(&election, Utc::now()), Phase::Unconfigured);
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let (start, end) = window();
        let election = election_with_window(start, end);
        let second = Duration::seconds(1);

        assert_eq!(phase(&election, start - second), Phase::Upcoming);
        assert_eq!(phase(&election, start), Phase::Active);
        assert_eq!(phase(&election, start + Duration::hours(4)), Phase::Active);
        assert_eq!(phase(&election, end), Phase::Active);
        assert_eq!(phase(&election, end + second), Phase::Completed);
    }

    #[test]
    fn zero_length_window_is_active_at_its_instant() {
        let (start, _) = window();
        let election = election_with_window(start, start);
        assert_eq!(phase(&election, start), Phase::Active);
        assert_eq!(
            phase(&election, start + Duration::milliseconds(1)),
            Phase::Completed
        );
    }

    #[test]
    fn display_order_groups_by_phase_and_keeps_storage_order() {
        let (start, end) = window();
        let now = start + Duration::hours(1);
        let day = Duration::days(1);

        let completed1 = election_with_window(start - day, end - day);
        let active1 = election_with_window(start, end);
        let unconfigured = Election::new(Id::new(), ElectionCore::placeholder());
        let upcoming = election_with_window(start + day, end + day);
        let active2 = election_with_window(start - day, end + day);
        let completed2 = election_with_window(start - day, start - day);

        let stored = vec![
            completed1.clone(),
            active1.clone(),
            unconfigured.clone(),
            upcoming.clone(),
            active2.clone(),
            completed2.clone(),
        ];
        let ordered: Vec<Id> = order_for_display(stored, now)
            .into_iter()
            .map(|e| e.id)
            .collect();

        let expected = vec![
            active1.id,
            active2.id,
            upcoming.id,
            completed1.id,
            completed2.id,
            unconfigured.id,
        ];
        assert_eq!(ordered, expected);
    }
}
