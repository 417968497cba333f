use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::WaitlistStatus;

/// A patient waiting for a slot, with an optional preferred window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRequest {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_type_id: Option<Uuid>,
    pub preferred_start_at: Option<DateTime<Utc>>,
    pub preferred_end_at: Option<DateTime<Utc>>,
    /// 1 (highest) to 5.
    pub priority: i64,
    pub note: Option<String>,
    pub status: WaitlistStatus,
    /// Set once the request has been booked.
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
