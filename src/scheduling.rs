//! Scheduling conflict resolver.
//!
//! Two operations over data supplied by a [`ScheduleStore`]:
//! - [`resolve_end_time`] — effective end of a proposed appointment
//! - [`check_conflicts`] — first overlapping booking for the same provider and,
//!   separately, the same location
//!
//! Overlap is half-open: `[a_start, a_end)` and `[b_start, b_end)` conflict iff
//! `a_start < b_end && a_end > b_start`. Touching boundaries never conflict.
//! The resolver holds no state and writes nothing; policy (whether a conflict
//! blocks a booking) belongs to the caller.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DEFAULT_APPOINTMENT_DURATION_MIN;
use crate::db::repository::{self, OverlapScope};
use crate::db::DatabaseError;
use crate::models::ConflictMatch;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("End time {end} must be after start time {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Appointment end time is out of range")]
    EndOutOfRange,
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Time window
// ═══════════════════════════════════════════════════════════

/// A non-empty half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Fails with `InvalidInterval` unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulingError> {
        if end <= start {
            return Err(SchedulingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when the two windows share actual duration.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

// ═══════════════════════════════════════════════════════════
// Store seam
// ═══════════════════════════════════════════════════════════

/// Read-only queries the resolver needs from persistent storage.
///
/// Errors are passed through to the caller untouched; the resolver does not retry.
pub trait ScheduleStore {
    /// Default duration in minutes, `None` if the type is unknown.
    fn appointment_type_duration(&self, type_id: &Uuid) -> Result<Option<i64>, DatabaseError>;

    /// Any one appointment in `scope` overlapping `window`, ignoring `exclude`.
    fn find_overlap(
        &self,
        scope: OverlapScope,
        scope_id: &Uuid,
        window: &TimeWindow,
        exclude: Option<&Uuid>,
    ) -> Result<Option<ConflictMatch>, DatabaseError>;
}

impl ScheduleStore for Connection {
    fn appointment_type_duration(&self, type_id: &Uuid) -> Result<Option<i64>, DatabaseError> {
        repository::get_default_duration(self, type_id)
    }

    fn find_overlap(
        &self,
        scope: OverlapScope,
        scope_id: &Uuid,
        window: &TimeWindow,
        exclude: Option<&Uuid>,
    ) -> Result<Option<ConflictMatch>, DatabaseError> {
        repository::find_overlapping_appointment(
            self,
            scope,
            scope_id,
            &window.start,
            &window.end,
            exclude,
        )
    }
}

// ═══════════════════════════════════════════════════════════
// End-time resolution
// ═══════════════════════════════════════════════════════════

/// Effective end of an appointment.
///
/// An explicit end always wins and is returned unchanged. Otherwise the
/// type's default duration is added to `start_at`; an unknown type falls
/// back to 30 minutes rather than failing.
pub fn resolve_end_time<S: ScheduleStore + ?Sized>(
    store: &S,
    appointment_type_id: &Uuid,
    start_at: DateTime<Utc>,
    explicit_end_at: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, SchedulingError> {
    if let Some(end_at) = explicit_end_at {
        return Ok(end_at);
    }

    let minutes = match store.appointment_type_duration(appointment_type_id)? {
        Some(minutes) => minutes,
        None => {
            tracing::debug!(
                appointment_type_id = %appointment_type_id,
                "Appointment type not found, using default duration"
            );
            DEFAULT_APPOINTMENT_DURATION_MIN
        }
    };

    Duration::try_minutes(minutes)
        .and_then(|duration| start_at.checked_add_signed(duration))
        .ok_or(SchedulingError::EndOutOfRange)
}

// ═══════════════════════════════════════════════════════════
// Conflict detection
// ═══════════════════════════════════════════════════════════

/// Proposed slot to test against existing bookings.
#[derive(Debug, Clone)]
pub struct ConflictCheckRequest {
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub window: TimeWindow,
    /// Set when re-checking an existing appointment so it never conflicts with itself.
    pub exclude_appointment_id: Option<Uuid>,
}

/// Independent provider and location results.
///
/// `location_conflict` is always `None` when the request carried no location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub provider_conflict: Option<ConflictMatch>,
    pub location_conflict: Option<ConflictMatch>,
}

impl ConflictReport {
    pub fn has_conflict(&self) -> bool {
        self.provider_conflict.is_some() || self.location_conflict.is_some()
    }
}

/// Existence checks for overlapping bookings. Read-only.
pub fn check_conflicts<S: ScheduleStore + ?Sized>(
    store: &S,
    request: &ConflictCheckRequest,
) -> Result<ConflictReport, DatabaseError> {
    let exclude = request.exclude_appointment_id.as_ref();

    let provider_conflict = store.find_overlap(
        OverlapScope::Provider,
        &request.provider_id,
        &request.window,
        exclude,
    )?;

    let location_conflict = match &request.location_id {
        Some(location_id) => {
            store.find_overlap(OverlapScope::Location, location_id, &request.window, exclude)?
        }
        None => None,
    };

    Ok(ConflictReport {
        provider_conflict,
        location_conflict,
    })
}

// ═══════════════════════════════════════════════════════════
// Combined evaluation
// ═══════════════════════════════════════════════════════════

/// Input of a schedule evaluation, as received from a booking form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub appointment_type_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub exclude_appointment_id: Option<Uuid>,
}

/// Effective end time plus conflict flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCheck {
    pub end_at: DateTime<Utc>,
    pub provider_conflict: bool,
    pub location_conflict: bool,
}

/// Resolves the end time, validates the interval, then checks conflicts.
pub fn evaluate<S: ScheduleStore + ?Sized>(
    store: &S,
    input: &ScheduleInput,
) -> Result<(TimeWindow, ConflictReport), SchedulingError> {
    let end_at = resolve_end_time(store, &input.appointment_type_id, input.start_at, input.end_at)?;
    let window = TimeWindow::new(input.start_at, end_at)?;
    let report = check_conflicts(
        store,
        &ConflictCheckRequest {
            provider_id: input.provider_id,
            location_id: input.location_id,
            window,
            exclude_appointment_id: input.exclude_appointment_id,
        },
    )?;
    Ok((window, report))
}

/// Flattens an evaluation into the form returned to booking clients.
pub fn summarize(window: &TimeWindow, report: &ConflictReport) -> ScheduleCheck {
    ScheduleCheck {
        end_at: window.end,
        provider_conflict: report.provider_conflict.is_some(),
        location_conflict: report.location_conflict.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;

    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::repository::insert_appointment;
    use crate::db::sqlite::open_memory_database;

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    /// Store over a plain list of (id, provider, location, window) rows.
    #[derive(Default)]
    struct ListStore {
        durations: Vec<(Uuid, i64)>,
        rows: Vec<(Uuid, Uuid, Option<Uuid>, TimeWindow)>,
        queries: Cell<u32>,
    }

    impl ScheduleStore for ListStore {
        fn appointment_type_duration(&self, type_id: &Uuid) -> Result<Option<i64>, DatabaseError> {
            Ok(self.durations.iter().find(|(id, _)| id == type_id).map(|(_, m)| *m))
        }

        fn find_overlap(
            &self,
            scope: OverlapScope,
            scope_id: &Uuid,
            window: &TimeWindow,
            exclude: Option<&Uuid>,
        ) -> Result<Option<ConflictMatch>, DatabaseError> {
            self.queries.set(self.queries.get() + 1);
            Ok(self
                .rows
                .iter()
                .filter(|(id, provider, location, _)| {
                    let in_scope = match scope {
                        OverlapScope::Provider => provider == scope_id,
                        OverlapScope::Location => location.as_ref() == Some(scope_id),
                    };
                    in_scope && Some(id) != exclude
                })
                .find(|(_, _, _, w)| w.overlaps(window))
                .map(|(id, _, _, w)| ConflictMatch {
                    id: *id,
                    start_at: w.start(),
                    end_at: w.end(),
                }))
        }
    }

    /// Store whose every query fails, to check propagation.
    struct BrokenStore;

    impl ScheduleStore for BrokenStore {
        fn appointment_type_duration(&self, _: &Uuid) -> Result<Option<i64>, DatabaseError> {
            Err(DatabaseError::ConstraintViolation("store offline".into()))
        }

        fn find_overlap(
            &self,
            _: OverlapScope,
            _: &Uuid,
            _: &TimeWindow,
            _: Option<&Uuid>,
        ) -> Result<Option<ConflictMatch>, DatabaseError> {
            Err(DatabaseError::ConstraintViolation("store offline".into()))
        }
    }

    // ── TimeWindow ──────────────────────────────────────────

    #[test]
    fn window_requires_end_after_start() {
        assert!(matches!(
            TimeWindow::new(at(9, 0), at(9, 0)),
            Err(SchedulingError::InvalidInterval { .. })
        ));
        assert!(matches!(
            TimeWindow::new(at(10, 0), at(9, 0)),
            Err(SchedulingError::InvalidInterval { .. })
        ));
        assert!(TimeWindow::new(at(9, 0), at(9, 1)).is_ok());
    }

    #[test]
    fn disjoint_and_touching_windows_never_overlap() {
        // Every (a, b) with a.end <= b.start on a 15 minute grid across the morning.
        let slots: Vec<DateTime<Utc>> = (0..12).map(|i| at(8, 0) + Duration::minutes(15 * i)).collect();
        for (i, &a_start) in slots.iter().enumerate() {
            for (j, &a_end) in slots.iter().enumerate().skip(i + 1) {
                for (k, &b_start) in slots.iter().enumerate().skip(j) {
                    for &b_end in slots.iter().skip(k + 1) {
                        let a = window(a_start, a_end);
                        let b = window(b_start, b_end);
                        assert!(!a.overlaps(&b), "{a:?} vs {b:?}");
                        assert!(!b.overlaps(&a), "{b:?} vs {a:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn intersecting_windows_always_overlap() {
        let slots: Vec<DateTime<Utc>> = (0..10).map(|i| at(8, 0) + Duration::minutes(10 * i)).collect();
        for &a_start in &slots {
            for &a_end in slots.iter().filter(|&&e| e > a_start) {
                for &b_start in &slots {
                    for &b_end in slots.iter().filter(|&&e| e > b_start) {
                        let a = window(a_start, a_end);
                        let b = window(b_start, b_end);
                        let expected = a_start < b_end && b_start < a_end;
                        assert_eq!(a.overlaps(&b), expected, "{a:?} vs {b:?}");
                        assert_eq!(a.overlaps(&b), b.overlaps(&a));
                    }
                }
            }
        }
    }

    // ── resolve_end_time ────────────────────────────────────

    #[test]
    fn explicit_end_wins_over_type_duration() {
        let type_id = Uuid::new_v4();
        let store = ListStore {
            durations: vec![(type_id, 60)],
            ..Default::default()
        };
        let explicit = at(9, 10);
        let end = resolve_end_time(&store, &type_id, at(9, 0), Some(explicit)).unwrap();
        assert_eq!(end, explicit);
    }

    #[test]
    fn explicit_end_returned_even_if_not_after_start() {
        // Validation is the caller's job; the resolver does not second-guess an explicit end.
        let store = ListStore::default();
        let end = resolve_end_time(&store, &Uuid::new_v4(), at(9, 0), Some(at(8, 0))).unwrap();
        assert_eq!(end, at(8, 0));
    }

    #[test]
    fn explicit_end_skips_store_entirely() {
        let end = resolve_end_time(&BrokenStore, &Uuid::new_v4(), at(9, 0), Some(at(9, 20))).unwrap();
        assert_eq!(end, at(9, 20));
    }

    #[test]
    fn type_duration_added_to_start() {
        let type_id = Uuid::new_v4();
        let store = ListStore {
            durations: vec![(type_id, 40)],
            ..Default::default()
        };
        let end = resolve_end_time(&store, &type_id, at(9, 0), None).unwrap();
        assert_eq!(end, at(9, 40));
    }

    #[test]
    fn unknown_type_falls_back_to_thirty_minutes() {
        let store = ListStore::default();
        let end = resolve_end_time(&store, &Uuid::new_v4(), at(9, 0), None).unwrap();
        assert_eq!(end, at(9, 30));
    }

    #[test]
    fn duration_carries_across_midnight_and_year_end() {
        let type_id = Uuid::new_v4();
        let store = ListStore {
            durations: vec![(type_id, 60)],
            ..Default::default()
        };
        let start = Utc.with_ymd_and_hms(2026, 12, 31, 23, 30, 0).unwrap();
        let end = resolve_end_time(&store, &type_id, start, None).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 30, 0).unwrap());
    }

    #[test]
    fn oversized_duration_is_out_of_range() {
        let type_id = Uuid::new_v4();
        for minutes in [i64::MAX, i64::MIN, 400_000_000_000] {
            let store = ListStore {
                durations: vec![(type_id, minutes)],
                ..Default::default()
            };
            let err = resolve_end_time(&store, &type_id, at(9, 0), None).unwrap_err();
            assert!(matches!(err, SchedulingError::EndOutOfRange), "{minutes}");
        }
    }

    #[test]
    fn store_failure_propagates_from_resolve() {
        let err = resolve_end_time(&BrokenStore, &Uuid::new_v4(), at(9, 0), None).unwrap_err();
        assert!(matches!(err, SchedulingError::Store(_)));
    }

    // ── check_conflicts ─────────────────────────────────────

    #[test]
    fn provider_touching_boundary_is_not_conflict() {
        let provider = Uuid::new_v4();
        let store = ListStore {
            rows: vec![(Uuid::new_v4(), provider, None, window(at(9, 0), at(9, 30)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: provider,
                location_id: None,
                window: window(at(9, 30), at(10, 0)),
                exclude_appointment_id: None,
            },
        )
        .unwrap();
        assert!(!report.has_conflict());
    }

    #[test]
    fn provider_overlap_is_conflict() {
        let provider = Uuid::new_v4();
        let existing = Uuid::new_v4();
        let store = ListStore {
            rows: vec![(existing, provider, None, window(at(9, 0), at(9, 30)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: provider,
                location_id: None,
                window: window(at(9, 15), at(9, 45)),
                exclude_appointment_id: None,
            },
        )
        .unwrap();
        assert_eq!(report.provider_conflict.unwrap().id, existing);
        assert!(report.location_conflict.is_none());
    }

    #[test]
    fn other_provider_does_not_conflict() {
        let store = ListStore {
            rows: vec![(Uuid::new_v4(), Uuid::new_v4(), None, window(at(9, 0), at(9, 30)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: Uuid::new_v4(),
                location_id: None,
                window: window(at(9, 0), at(9, 30)),
                exclude_appointment_id: None,
            },
        )
        .unwrap();
        assert!(report.provider_conflict.is_none());
    }

    #[test]
    fn no_location_means_no_location_query() {
        let provider = Uuid::new_v4();
        let location = Uuid::new_v4();
        let store = ListStore {
            rows: vec![(Uuid::new_v4(), Uuid::new_v4(), Some(location), window(at(9, 0), at(10, 0)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: provider,
                location_id: None,
                window: window(at(9, 15), at(9, 45)),
                exclude_appointment_id: None,
            },
        )
        .unwrap();
        assert!(report.location_conflict.is_none());
        assert_eq!(store.queries.get(), 1);
    }

    #[test]
    fn location_conflict_reported_independently() {
        let location = Uuid::new_v4();
        let store = ListStore {
            rows: vec![(Uuid::new_v4(), Uuid::new_v4(), Some(location), window(at(9, 0), at(10, 0)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: Uuid::new_v4(),
                location_id: Some(location),
                window: window(at(9, 15), at(9, 45)),
                exclude_appointment_id: None,
            },
        )
        .unwrap();
        assert!(report.provider_conflict.is_none());
        assert!(report.location_conflict.is_some());
        assert_eq!(store.queries.get(), 2);
    }

    #[test]
    fn excluded_appointment_never_conflicts_with_itself() {
        let provider = Uuid::new_v4();
        let location = Uuid::new_v4();
        let me = Uuid::new_v4();
        let store = ListStore {
            rows: vec![(me, provider, Some(location), window(at(9, 0), at(9, 30)))],
            ..Default::default()
        };
        let report = check_conflicts(
            &store,
            &ConflictCheckRequest {
                provider_id: provider,
                location_id: Some(location),
                window: window(at(9, 0), at(9, 45)),
                exclude_appointment_id: Some(me),
            },
        )
        .unwrap();
        assert_eq!(report, ConflictReport::default());
    }

    #[test]
    fn store_failure_propagates_from_check() {
        let err = check_conflicts(
            &BrokenStore,
            &ConflictCheckRequest {
                provider_id: Uuid::new_v4(),
                location_id: None,
                window: window(at(9, 0), at(9, 30)),
                exclude_appointment_id: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    // ── evaluate (SQLite-backed) ────────────────────────────

    #[test]
    fn evaluate_against_sqlite_store() {
        let conn = open_memory_database().unwrap();
        let ids = seed_directory(&conn);
        let existing = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &existing).unwrap();

        let touching = ScheduleInput {
            provider_id: ids.provider_id,
            location_id: Some(ids.location_id),
            appointment_type_id: ids.type_id,
            start_at: at(9, 30),
            end_at: Some(at(10, 0)),
            exclude_appointment_id: None,
        };
        let (w, report) = evaluate(&conn, &touching).unwrap();
        assert_eq!(
            summarize(&w, &report),
            ScheduleCheck {
                end_at: at(10, 0),
                provider_conflict: false,
                location_conflict: false,
            }
        );

        let overlapping = ScheduleInput {
            start_at: at(9, 15),
            end_at: None,
            ..touching.clone()
        };
        let (w, report) = evaluate(&conn, &overlapping).unwrap();
        let check = summarize(&w, &report);
        assert_eq!(check.end_at, at(9, 15) + Duration::minutes(SEEDED_TYPE_MINUTES));
        assert!(check.provider_conflict);
        assert!(check.location_conflict);
    }

    #[test]
    fn evaluate_rejects_inverted_explicit_end() {
        let conn = open_memory_database().unwrap();
        let ids = seed_directory(&conn);
        let input = ScheduleInput {
            provider_id: ids.provider_id,
            location_id: None,
            appointment_type_id: ids.type_id,
            start_at: at(10, 0),
            end_at: Some(at(10, 0)),
            exclude_appointment_id: None,
        };
        assert!(matches!(
            evaluate(&conn, &input),
            Err(SchedulingError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn evaluate_unknown_type_uses_default_duration() {
        let conn = open_memory_database().unwrap();
        let ids = seed_directory(&conn);
        let input = ScheduleInput {
            provider_id: ids.provider_id,
            location_id: None,
            appointment_type_id: Uuid::new_v4(),
            start_at: at(13, 0),
            end_at: None,
            exclude_appointment_id: None,
        };
        let (w, report) = evaluate(&conn, &input).unwrap();
        assert_eq!(w.end(), at(13, 30));
        assert!(!report.has_conflict());
    }

    #[test]
    fn sqlite_store_honors_sub_millisecond_overlap() {
        let conn = open_memory_database().unwrap();
        let ids = seed_directory(&conn);
        let existing = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &existing).unwrap();

        let request = ConflictCheckRequest {
            provider_id: ids.provider_id,
            location_id: Some(ids.location_id),
            window: window(at(8, 30), at(9, 0) + Duration::microseconds(500)),
            exclude_appointment_id: None,
        };
        let existing_window = window(existing.start_at, existing.end_at);
        assert!(request.window.overlaps(&existing_window));

        let report = check_conflicts(&conn, &request).unwrap();
        assert_eq!(report.provider_conflict.map(|c| c.id), Some(existing.id));
        assert_eq!(report.location_conflict.map(|c| c.id), Some(existing.id));

        let touching = ConflictCheckRequest {
            window: window(at(8, 30), at(9, 0)),
            ..request
        };
        assert!(!check_conflicts(&conn, &touching).unwrap().has_conflict());

        let after = ConflictCheckRequest {
            window: window(at(9, 30) - Duration::nanoseconds(1), at(10, 0)),
            ..touching
        };
        assert!(check_conflicts(&conn, &after).unwrap().has_conflict());
    }
}
