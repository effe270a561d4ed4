//! Query backends for chatdesk.
//!
//! Both backends implement [`chatdesk_core::QueryRouter`]; [`build_router`]
//! picks one from the application configuration.

pub mod factory;
pub mod reply;
pub mod stdio_agent_router;
pub mod webhook_router;

pub use factory::{RouterConfig, build_router};
pub use reply::extract_reply;
pub use stdio_agent_router::{AgentProcessConfig, StdioAgentRouter};
pub use webhook_router::WebhookRouter;
