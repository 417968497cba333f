pub mod appointment;
pub mod appointment_type;
pub mod audit;
pub mod directory;
pub mod enums;
pub mod filters;
pub mod waitlist;

pub use appointment::*;
pub use appointment_type::*;
pub use audit::*;
pub use directory::*;
pub use enums::*;
pub use filters::*;
pub use waitlist::*;
