use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde form matches the stored string.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Scheduled => "SCHEDULED",
    Confirmed => "CONFIRMED",
    CheckedIn => "CHECKED_IN",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    NoShow => "NO_SHOW",
    Canceled => "CANCELED",
});

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

str_enum!(WaitlistStatus {
    Open => "OPEN",
    Contacted => "CONTACTED",
    Booked => "BOOKED",
    Closed => "CLOSED",
});

impl Default for WaitlistStatus {
    fn default() -> Self {
        Self::Open
    }
}

str_enum!(AuditAction {
    Create => "CREATE",
    Update => "UPDATE",
    StatusChange => "STATUS_CHANGE",
});

str_enum!(Role {
    Admin => "ADMIN",
    Physician => "PHYSICIAN",
    Nurse => "NURSE",
    FrontDesk => "FRONT_DESK",
    Billing => "BILLING",
});

str_enum!(Permission {
    ViewDashboard => "VIEW_DASHBOARD",
    ManagePatients => "MANAGE_PATIENTS",
    ManageAppointments => "MANAGE_APPOINTMENTS",
    AppointmentOverride => "APPOINTMENT_OVERRIDE",
    ManageClaims => "MANAGE_CLAIMS",
    ManageBilling => "MANAGE_BILLING",
    ManageStaff => "MANAGE_STAFF",
    ViewReports => "VIEW_REPORTS",
    ViewAudit => "VIEW_AUDIT",
    ManageSettings => "MANAGE_SETTINGS",
    ManageSchedules => "MANAGE_SCHEDULES",
    ManageMessages => "MANAGE_MESSAGES",
    ManageDocuments => "MANAGE_DOCUMENTS",
    ViewPortal => "VIEW_PORTAL",
});

impl Permission {
    pub const ALL: [Permission; 14] = [
        Self::ViewDashboard,
        Self::ManagePatients,
        Self::ManageAppointments,
        Self::AppointmentOverride,
        Self::ManageClaims,
        Self::ManageBilling,
        Self::ManageStaff,
        Self::ViewReports,
        Self::ViewAudit,
        Self::ManageSettings,
        Self::ManageSchedules,
        Self::ManageMessages,
        Self::ManageDocuments,
        Self::ViewPortal,
    ];
}
