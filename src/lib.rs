pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;

pub use crate::core::*;
pub use orchestration::{BatchPublishOptions, BatchPublishResult, BatchPublisher};
pub use plugins::{CurseforgePublisher, ModrinthPublisher, PluginLoader};
pub use security::SecureTokenManager;
