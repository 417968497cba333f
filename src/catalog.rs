//! Practice reference data: appointment types, providers, locations, and
//! the audit trail read side.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;

use crate::booking::Actor;
use crate::config::{AUDIT_PAGE_SIZE, MAX_TYPE_DURATION_MIN, MIN_TYPE_DURATION_MIN};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::rbac::PermissionDenied;

const ENTITY_APPOINTMENT_TYPE: &str = "AppointmentType";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),
    #[error("Appointment type not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

// ═══════════════════════════════════════════════════════════
// Appointment types
// ═══════════════════════════════════════════════════════════

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointmentType {
    pub name: String,
    pub default_duration_min: i64,
    pub color: String,
    #[serde(default)]
    pub buffer_before_min: i64,
    #[serde(default)]
    pub buffer_after_min: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentTypePatch {
    pub name: Option<String>,
    pub default_duration_min: Option<i64>,
    pub color: Option<String>,
    pub buffer_before_min: Option<i64>,
    pub buffer_after_min: Option<i64>,
    pub is_active: Option<bool>,
}

/// Name non-empty, duration between 5 minutes and one day, color at least
/// 3 characters, buffers non-negative.
fn validate_type(ty: &AppointmentType) -> Result<(), CatalogError> {
    if ty.name.trim().is_empty() {
        return Err(CatalogError::Validation("Name is required".into()));
    }
    if ty.default_duration_min < MIN_TYPE_DURATION_MIN {
        return Err(CatalogError::Validation(format!(
            "Default duration must be at least {MIN_TYPE_DURATION_MIN} minutes"
        )));
    }
    if ty.default_duration_min > MAX_TYPE_DURATION_MIN {
        return Err(CatalogError::Validation(format!(
            "Default duration must be at most {MAX_TYPE_DURATION_MIN} minutes"
        )));
    }
    if ty.color.chars().count() < 3 {
        return Err(CatalogError::Validation("Color must be at least 3 characters".into()));
    }
    if ty.buffer_before_min < 0 || ty.buffer_after_min < 0 {
        return Err(CatalogError::Validation("Buffers cannot be negative".into()));
    }
    Ok(())
}

pub fn list_appointment_types(conn: &Connection, actor: &Actor) -> Result<Vec<AppointmentType>, CatalogError> {
    actor.require(Permission::ManageSchedules)?;
    Ok(repository::list_appointment_types(conn)?)
}

pub fn create_appointment_type(
    conn: &mut Connection,
    actor: &Actor,
    input: NewAppointmentType,
) -> Result<AppointmentType, CatalogError> {
    actor.require(Permission::ManageSchedules)?;

    let ty = AppointmentType {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        default_duration_min: input.default_duration_min,
        color: input.color,
        buffer_before_min: input.buffer_before_min,
        buffer_after_min: input.buffer_after_min,
        is_active: input.is_active,
    };
    validate_type(&ty)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    repository::insert_appointment_type(&tx, &ty)?;
    record_type_audit(&tx, actor, AuditAction::Create, None, Some(&ty))?;
    tx.commit()?;

    tracing::info!(appointment_type_id = %ty.id, name = %ty.name, "Appointment type created");
    Ok(ty)
}

pub fn update_appointment_type(
    conn: &mut Connection,
    actor: &Actor,
    id: &Uuid,
    patch: AppointmentTypePatch,
) -> Result<AppointmentType, CatalogError> {
    actor.require(Permission::ManageSchedules)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let before = repository::get_appointment_type(&tx, id)?.ok_or(CatalogError::NotFound(*id))?;

    let after = AppointmentType {
        id: before.id,
        name: patch
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| before.name.clone()),
        default_duration_min: patch.default_duration_min.unwrap_or(before.default_duration_min),
        color: patch.color.unwrap_or_else(|| before.color.clone()),
        buffer_before_min: patch.buffer_before_min.unwrap_or(before.buffer_before_min),
        buffer_after_min: patch.buffer_after_min.unwrap_or(before.buffer_after_min),
        is_active: patch.is_active.unwrap_or(before.is_active),
    };
    validate_type(&after)?;

    repository::update_appointment_type(&tx, &after)?;
    record_type_audit(&tx, actor, AuditAction::Update, Some(&before), Some(&after))?;
    tx.commit()?;

    tracing::info!(appointment_type_id = %id, "Appointment type updated");
    Ok(after)
}

fn record_type_audit(
    conn: &Connection,
    actor: &Actor,
    action: AuditAction,
    before: Option<&AppointmentType>,
    after: Option<&AppointmentType>,
) -> Result<(), DatabaseError> {
    let entity_id = after.or(before).map(|t| t.id.to_string()).unwrap_or_default();
    repository::insert_audit_entry(
        conn,
        &AuditEntry {
            id: Uuid::new_v4(),
            actor_user_id: Some(actor.user_id.clone()),
            action,
            entity_type: ENTITY_APPOINTMENT_TYPE.into(),
            entity_id,
            before: before.map(serde_json::to_value).transpose()?,
            after: after.map(serde_json::to_value).transpose()?,
            created_at: Utc::now(),
        },
    )
}

// ═══════════════════════════════════════════════════════════
// Directory
// ═══════════════════════════════════════════════════════════

pub fn list_providers(conn: &Connection, actor: &Actor) -> Result<Vec<Provider>, CatalogError> {
    actor.require(Permission::ViewDashboard)?;
    Ok(repository::list_active_providers(conn)?)
}

pub fn list_locations(conn: &Connection, actor: &Actor) -> Result<Vec<Location>, CatalogError> {
    actor.require(Permission::ViewDashboard)?;
    Ok(repository::list_active_locations(conn)?)
}

// ═══════════════════════════════════════════════════════════
// Audit
// ═══════════════════════════════════════════════════════════

/// A page of the audit trail plus paging metadata.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub page: u32,
    pub page_size: i64,
}

pub fn list_audit(conn: &Connection, actor: &Actor, filter: &AuditFilter) -> Result<AuditPage, CatalogError> {
    actor.require(Permission::ViewAudit)?;
    let entries = repository::list_audit_entries(conn, filter)?;
    Ok(AuditPage {
        entries,
        page: filter.page.max(1),
        page_size: AUDIT_PAGE_SIZE,
    })
}
