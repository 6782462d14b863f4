//! Business logic: session lifecycle and revocation housekeeping.

pub mod session;
pub mod sweep;

pub use session::{Credentials, Registration, SessionService};
pub use sweep::spawn_revocation_sweep;
