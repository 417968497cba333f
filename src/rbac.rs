//! Role-based access control for practice staff.
//!
//! Static matrix, default deny:
//! - ADMIN → every permission
//! - PHYSICIAN → dashboard, appointments, patients, documents, messages, reports
//! - NURSE → dashboard, appointments, patients, documents, messages
//! - FRONT_DESK → dashboard, appointments, patients, messages, schedules
//! - BILLING → dashboard, billing, claims, reports
//!
//! `APPOINTMENT_OVERRIDE` is held by ADMIN only.

use crate::models::{Permission, Role};

// ═══════════════════════════════════════════════════════════
// Matrix
// ═══════════════════════════════════════════════════════════

const PHYSICIAN: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ManageAppointments,
    Permission::ManagePatients,
    Permission::ManageDocuments,
    Permission::ManageMessages,
    Permission::ViewReports,
];

const NURSE: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ManageAppointments,
    Permission::ManagePatients,
    Permission::ManageDocuments,
    Permission::ManageMessages,
];

const FRONT_DESK: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ManageAppointments,
    Permission::ManagePatients,
    Permission::ManageMessages,
    Permission::ManageSchedules,
];

const BILLING: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ManageBilling,
    Permission::ManageClaims,
    Permission::ViewReports,
];

/// Capabilities held by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSet(&'static [Permission]);

impl PermissionSet {
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }
}

pub fn permissions_for(role: Role) -> PermissionSet {
    match role {
        Role::Admin => PermissionSet(&Permission::ALL),
        Role::Physician => PermissionSet(PHYSICIAN),
        Role::Nurse => PermissionSet(NURSE),
        Role::FrontDesk => PermissionSet(FRONT_DESK),
        Role::Billing => PermissionSet(BILLING),
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(permission)
}

// ═══════════════════════════════════════════════════════════
// Enforcement
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Role {role} lacks permission {permission}")]
pub struct PermissionDenied {
    pub role: Role,
    pub permission: Permission,
}

/// Fails with [`PermissionDenied`] unless `role` holds `permission`.
pub fn require(role: Role, permission: Permission) -> Result<(), PermissionDenied> {
    if has_permission(role, permission) {
        Ok(())
    } else {
        tracing::debug!(role = %role, permission = %permission, "Permission denied");
        Err(PermissionDenied { role, permission })
    }
}
