pub mod artifacts;
pub mod config;
pub mod config_loader;
pub mod dependencies;
pub mod error;
pub mod http;
pub mod traits;
pub mod types;
pub mod upload;

pub use error::*;
pub use traits::*;
pub use types::{ChangelogType, Environment, LoaderType, Platform, ReleaseType};
