//! Orchestration layer for multi-platform publishing

pub mod batch_publisher;

pub use batch_publisher::{BatchPublishOptions, BatchPublishResult, BatchPublisher};
