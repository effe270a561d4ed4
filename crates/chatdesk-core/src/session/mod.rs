//! Session domain module.
//!
//! This module contains the request-cycle state machine that sits between a
//! front end, the conversation store and a query router.
//!
//! # Module Structure
//!
//! - `state`: Session state types (`SessionState`, `SessionPhase`, `SubmitOutcome`)
//! - `controller`: Request-cycle orchestration (`SessionController`)
//!
//! # Usage
//!
//! ```ignore
//! use chatdesk_core::session::{SessionController, SubmitOutcome};
//!
//! let controller = SessionController::new(store, router);
//! match controller.submit("hello").await {
//!     SubmitOutcome::Replied { reply, .. } => println!("{reply}"),
//!     _ => {}
//! }
//! ```

mod controller;
mod state;


// Re-export public API
pub use controller::{DEFAULT_QUERY_TIMEOUT, QUIT_COMMAND, SessionController};
pub use state::{IgnoreReason, SessionPhase, SessionState, SubmitOutcome};
