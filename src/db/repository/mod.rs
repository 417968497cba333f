//! Repository layer — entity-scoped database operations.
//!
//! All public functions are re-exported here.

mod appointment;
mod appointment_type;
mod audit;
mod directory;
mod waitlist;

#[cfg(test)]
pub(crate) mod fixtures;

pub use appointment::*;
pub use appointment_type::*;
pub use audit::*;
pub use directory::*;
pub use waitlist::*;

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::fixtures::*;
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    // ── Appointments ────────────────────────────────────────

    #[test]
    fn insert_and_get_appointment() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let appt = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &appt).unwrap();

        let loaded = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(loaded, appt);
    }

    #[test]
    fn get_missing_appointment_is_none() {
        let conn = test_db();
        assert!(get_appointment(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_inverted_window() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let appt = make_appointment(&ids, at(10, 0), at(9, 0));
        let err = insert_appointment(&conn, &appt).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn update_appointment_persists_changes() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let mut appt = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &appt).unwrap();

        appt.start_at = at(11, 0);
        appt.end_at = at(11, 45);
        appt.notes = Some("Moved to late morning".into());
        appt.updated_by = Some("user-2".into());
        update_appointment(&conn, &appt).unwrap();

        let loaded = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(loaded.start_at, at(11, 0));
        assert_eq!(loaded.end_at, at(11, 45));
        assert_eq!(loaded.notes.as_deref(), Some("Moved to late morning"));
        assert_eq!(loaded.updated_by.as_deref(), Some("user-2"));
    }

    #[test]
    fn update_missing_appointment_is_not_found() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let appt = make_appointment(&ids, at(9, 0), at(9, 30));
        let err = update_appointment(&conn, &appt).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn status_update_changes_only_status() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let appt = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &appt).unwrap();

        update_appointment_status(&conn, &appt.id, AppointmentStatus::CheckedIn, "nurse-1", &Utc::now())
            .unwrap();

        let loaded = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::CheckedIn);
        assert_eq!(loaded.start_at, appt.start_at);
        assert_eq!(loaded.updated_by.as_deref(), Some("nurse-1"));
    }

    #[test]
    fn status_update_missing_is_not_found() {
        let conn = test_db();
        let err = update_appointment_status(
            &conn,
            &Uuid::new_v4(),
            AppointmentStatus::Canceled,
            "u",
            &Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_appointments_ordered_by_start() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let late = make_appointment(&ids, at(14, 0), at(14, 30));
        let early = make_appointment(&ids, at(8, 0), at(8, 30));
        insert_appointment(&conn, &late).unwrap();
        insert_appointment(&conn, &early).unwrap();

        let all = list_appointments(&conn, &AppointmentFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, early.id);
        assert_eq!(all[1].id, late.id);
    }

    #[test]
    fn list_appointments_applies_filters() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let other_provider = seed_provider(&conn, "Dr. Okafor");

        let morning = make_appointment(&ids, at(9, 0), at(9, 30));
        let afternoon = make_appointment(&ids, at(15, 0), at(15, 30));
        let mut elsewhere = make_appointment(&ids, at(10, 0), at(10, 30));
        elsewhere.provider_id = other_provider;
        for appt in [&morning, &afternoon, &elsewhere] {
            insert_appointment(&conn, appt).unwrap();
        }

        let by_provider = list_appointments(
            &conn,
            &AppointmentFilter {
                provider_id: Some(other_provider),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_provider.len(), 1);
        assert_eq!(by_provider[0].id, elsewhere.id);

        let window = list_appointments(
            &conn,
            &AppointmentFilter {
                start_from: Some(at(9, 30)),
                end_until: Some(at(12, 0)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, elsewhere.id);

        let by_patient = list_appointments(
            &conn,
            &AppointmentFilter {
                patient_id: morning.patient_id,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_patient.len(), 1);
        assert_eq!(by_patient[0].id, morning.id);
    }

    #[test]
    fn overlap_query_is_half_open() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let existing = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &existing).unwrap();

        let touching = find_overlapping_appointment(
            &conn,
            OverlapScope::Provider,
            &ids.provider_id,
            &at(9, 30),
            &at(10, 0),
            None,
        )
        .unwrap();
        assert!(touching.is_none());

        let overlapping = find_overlapping_appointment(
            &conn,
            OverlapScope::Provider,
            &ids.provider_id,
            &at(9, 15),
            &at(9, 45),
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(overlapping.id, existing.id);
        assert_eq!(overlapping.start_at, at(9, 0));
        assert_eq!(overlapping.end_at, at(9, 30));
    }

    #[test]
    fn overlap_query_respects_exclusion() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let existing = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &existing).unwrap();

        let found = find_overlapping_appointment(
            &conn,
            OverlapScope::Location,
            &ids.location_id,
            &at(9, 0),
            &at(9, 30),
            Some(&existing.id),
        )
        .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn overlap_query_sub_second_boundary() {
        let conn = test_db();
        let ids = seed_directory(&conn);
        let existing = make_appointment(&ids, at(9, 0), at(9, 30));
        insert_appointment(&conn, &existing).unwrap();

        let found = find_overlapping_appointment(
            &conn,
            OverlapScope::Provider,
            &ids.provider_id,
            &(at(9, 30) - Duration::milliseconds(1)),
            &at(10, 0),
            None,
        )
        .unwrap();
        assert!(found.is_some());
    }

    // ── Appointment types ───────────────────────────────────

    #[test]
    fn appointment_type_crud() {
        let conn = test_db();
        let mut ty = make_type("Comprehensive Exam", 60);
        insert_appointment_type(&conn, &ty).unwrap();
        assert_eq!(get_default_duration(&conn, &ty.id).unwrap(), Some(60));

        ty.default_duration_min = 50;
        ty.is_active = false;
        update_appointment_type(&conn, &ty).unwrap();

        let loaded = get_appointment_type(&conn, &ty.id).unwrap().unwrap();
        assert_eq!(loaded.default_duration_min, 50);
        assert!(!loaded.is_active);
    }

    #[test]
    fn appointment_types_listed_by_name() {
        let conn = test_db();
        insert_appointment_type(&conn, &make_type("Hygiene Cleaning", 45)).unwrap();
        insert_appointment_type(&conn, &make_type("Consultation", 40)).unwrap();

        let names: Vec<String> = list_appointment_types(&conn)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Consultation", "Hygiene Cleaning"]);
    }

    #[test]
    fn unknown_type_has_no_duration() {
        let conn = test_db();
        assert_eq!(get_default_duration(&conn, &Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn zero_duration_type_rejected_by_schema() {
        let conn = test_db();
        let err = insert_appointment_type(&conn, &make_type("Broken", 0)).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn update_missing_type_is_not_found() {
        let conn = test_db();
        let err = update_appointment_type(&conn, &make_type("Ghost", 30)).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    // ── Directory ───────────────────────────────────────────

    #[test]
    fn only_active_directory_entries_listed() {
        let conn = test_db();
        seed_directory(&conn);
        insert_provider(
            &conn,
            &Provider {
                id: Uuid::new_v4(),
                name: "Dr. Retired".into(),
                specialty: None,
                color: None,
                is_active: false,
            },
        )
        .unwrap();
        insert_location(
            &conn,
            &Location {
                id: Uuid::new_v4(),
                name: "Closed Annex".into(),
                timezone: "UTC".into(),
                is_active: false,
            },
        )
        .unwrap();

        let providers = list_active_providers(&conn).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "Dr. Chen");

        let locations = list_active_locations(&conn).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].name, "Harbor Clinic");
    }

    // ── Audit ───────────────────────────────────────────────

    #[test]
    fn audit_entries_round_trip_with_snapshots() {
        let conn = test_db();
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            actor_user_id: Some("admin-1".into()),
            action: AuditAction::StatusChange,
            entity_type: "Appointment".into(),
            entity_id: "appt-1".into(),
            before: Some(serde_json::json!({ "status": "SCHEDULED" })),
            after: Some(serde_json::json!({ "status": "CANCELED" })),
            created_at: Utc::now(),
        };
        insert_audit_entry(&conn, &entry).unwrap();

        let listed = list_audit_entries(&conn, &AuditFilter { entity_type: None, page: 1 }).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].action, AuditAction::StatusChange);
        assert_eq!(listed[0].after.as_ref().unwrap()["status"], "CANCELED");
    }

    #[test]
    fn audit_entries_paginated_newest_first() {
        let conn = test_db();
        let base = Utc::now();
        for i in 0..35 {
            insert_audit_entry(
                &conn,
                &AuditEntry {
                    id: Uuid::new_v4(),
                    actor_user_id: None,
                    action: AuditAction::Create,
                    entity_type: if i % 5 == 0 { "AppointmentType" } else { "Appointment" }.into(),
                    entity_id: format!("e-{i}"),
                    before: None,
                    after: None,
                    created_at: base + Duration::seconds(i),
                },
            )
            .unwrap();
        }

        let first = list_audit_entries(&conn, &AuditFilter { entity_type: None, page: 1 }).unwrap();
        assert_eq!(first.len(), 30);
        assert_eq!(first[0].entity_id, "e-34");

        let second = list_audit_entries(&conn, &AuditFilter { entity_type: None, page: 2 }).unwrap();
        assert_eq!(second.len(), 5);

        let types = list_audit_entries(
            &conn,
            &AuditFilter {
                entity_type: Some("AppointmentType".into()),
                page: 1,
            },
        )
        .unwrap();
        assert_eq!(types.len(), 7);
    }

    #[test]
    fn audit_page_zero_treated_as_first() {
        let conn = test_db();
        let listed = list_audit_entries(&conn, &AuditFilter { entity_type: None, page: 0 }).unwrap();
        assert!(listed.is_empty());
    }

    // ── Waitlist ────────────────────────────────────────────

    fn make_waitlist(priority: i64, created_at: chrono::DateTime<Utc>) -> WaitlistRequest {
        WaitlistRequest {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_type_id: None,
            preferred_start_at: Some(at(14, 0)),
            preferred_end_at: None,
            priority,
            note: Some("Prefers afternoons".into()),
            status: WaitlistStatus::Open,
            appointment_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn waitlist_round_trips_and_updates() {
        let conn = test_db();
        let mut request = make_waitlist(2, at(8, 0));
        insert_waitlist_request(&conn, &request).unwrap();
        assert_eq!(get_waitlist_request(&conn, &request.id).unwrap().unwrap(), request);

        request.status = WaitlistStatus::Contacted;
        request.priority = 1;
        request.updated_at = at(8, 5);
        update_waitlist_request(&conn, &request).unwrap();
        assert_eq!(get_waitlist_request(&conn, &request.id).unwrap().unwrap(), request);
    }

    #[test]
    fn waitlist_priority_bounded_by_schema() {
        let conn = test_db();
        let err = insert_waitlist_request(&conn, &make_waitlist(6, at(8, 0))).unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn waitlist_listed_newest_first_with_status_filter() {
        let conn = test_db();
        let older = make_waitlist(3, at(8, 0));
        let mut newer = make_waitlist(1, at(8, 30));
        newer.status = WaitlistStatus::Closed;
        insert_waitlist_request(&conn, &older).unwrap();
        insert_waitlist_request(&conn, &newer).unwrap();

        let all = list_waitlist_requests(&conn, &WaitlistFilter::default()).unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let open = list_waitlist_requests(
            &conn,
            &WaitlistFilter {
                status: Some(WaitlistStatus::Open),
            },
        )
        .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, older.id);
    }

    #[test]
    fn update_missing_waitlist_is_not_found() {
        let conn = test_db();
        let err = update_waitlist_request(&conn, &make_waitlist(3, at(8, 0))).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
