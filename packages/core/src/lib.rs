// MillionHuts Portal Core
// Rust engine for the tenant portal: session-aware REST access and complaint lifecycle

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod protocol;
pub mod state;
pub mod utils;

// Re-exports для удобства
pub use api::{ComplaintManager, KycSubmission, NewComplaint, PgAPI, PortalAPI, TenantAPI};
pub use auth::{AuthEvent, AuthenticatedClient};
pub use config::Config;
pub use protocol::{HttpTransport, MediaFile, ReqwestTransport};
#[cfg(any(test, feature = "test-support"))]
pub use protocol::MemoryBackend;
pub use state::{SessionManager, SessionSnapshot};
pub use utils::error::{PortalError, Result};
