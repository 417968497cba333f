use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::enums::WaitlistStatus;

/// Appointment list filter. `start_from` bounds `start_at` from below,
/// `end_until` bounds `end_at` from above.
#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub start_from: Option<DateTime<Utc>>,
    pub end_until: Option<DateTime<Utc>>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    /// 1-based page number.
    pub page: u32,
}

#[derive(Debug, Default, Clone)]
pub struct WaitlistFilter {
    pub status: Option<WaitlistStatus>,
}
