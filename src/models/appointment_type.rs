use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Template for a visit: default duration plus display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub default_duration_min: i64,
    pub color: String,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    pub is_active: bool,
}
