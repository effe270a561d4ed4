pub mod async_dir_conversation_repository;
pub mod config_service;
pub mod dto;
pub mod paths;

pub use crate::async_dir_conversation_repository::AsyncDirConversationRepository;
pub use crate::config_service::ConfigService;
pub use crate::paths::ChatdeskPaths;
