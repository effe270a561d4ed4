pub mod config;
pub mod conversation;
pub mod error;
pub mod router;
pub mod session;

// Re-export common types
pub use config::{BackendKind, ChatdeskConfig};
pub use error::{ChatdeskError, Result};
pub use router::{QueryRouter, RouterError};
