//! Batch Publisher - Publishes one release to several platforms
//!
//! Features:
//! - Sequential (default) or bounded-parallel publishing
//! - Raised failures stop the remaining platforms only when
//!   `continue_on_error` is off
//! - Configuration aborts are recorded and never stop the batch
//! - Dry runs go through the same scheduling

use crate::core::traits::{DryRunResult, PlatformPublisher, PublishOutcome};
use crate::core::types::Platform;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Batch publishing options
#[derive(Debug, Clone)]
pub struct BatchPublishOptions {
    /// Publish one platform after another (default: true)
    pub sequential: bool,

    /// Keep going after a platform raised a failure (default: true)
    pub continue_on_error: bool,

    /// Maximum concurrent publishes in parallel mode (default: 2)
    pub max_concurrency: usize,

    /// Resolve and build metadata without uploading
    pub dry_run: bool,
}

impl Default for BatchPublishOptions {
    fn default() -> Self {
        Self {
            sequential: true,
            continue_on_error: true,
            max_concurrency: 2,
            dry_run: false,
        }
    }
}

/// Batch publish result
#[derive(Debug, Clone, Default)]
pub struct BatchPublishResult {
    /// Platforms that accepted the upload (or completed a dry run), in input order
    pub succeeded: Vec<Platform>,

    /// Platforms stopped by configuration problems, in platform order
    pub aborted: BTreeMap<Platform, Vec<String>>,

    /// Platforms that raised a failure with its message, in platform order
    pub failed: BTreeMap<Platform, String>,

    /// Platforms not attempted because an earlier one failed
    pub skipped: Vec<Platform>,

    /// Dry-run reports, in input order
    pub dry_runs: Vec<DryRunResult>,

    /// Nothing failed, aborted or was skipped
    pub success: bool,
}

/// What happened to a single platform
#[derive(Debug)]
enum PlatformRun {
    Published(Option<String>),
    DryRun(DryRunResult),
    Aborted(Vec<String>),
    Failed(String),
    Skipped,
}

/// BatchPublisher - Runs a set of platform publishers
pub struct BatchPublisher {
    publishers: Vec<Arc<dyn PlatformPublisher>>,
}

impl BatchPublisher {
    pub fn new(publishers: Vec<Arc<dyn PlatformPublisher>>) -> Self {
        Self { publishers }
    }

    /// Platforms in scheduling order
    pub fn platforms(&self) -> Vec<Platform> {
        self.publishers.iter().map(|p| p.platform()).collect()
    }

    /// Publish to every platform according to `options`
    pub async fn publish_all(&self, options: &BatchPublishOptions) -> BatchPublishResult {
        let names: Vec<&str> = self.publishers.iter().map(|p| p.platform().as_str()).collect();
        info!(
            platforms = %names.join(", "),
            sequential = options.sequential,
            continue_on_error = options.continue_on_error,
            dry_run = options.dry_run,
            "Batch publishing to {} platforms",
            names.len()
        );

        let runs = if options.sequential {
            self.run_sequentially(options).await
        } else {
            self.run_in_parallel(options).await
        };

        let mut result = BatchPublishResult::default();
        for (platform, run) in runs {
            match run {
                PlatformRun::Published(_) => result.succeeded.push(platform),
                PlatformRun::DryRun(report) => {
                    if report.aborted.is_empty() {
                        result.succeeded.push(platform);
                    } else {
                        result.aborted.insert(platform, report.aborted.clone());
                    }
                    result.dry_runs.push(report);
                }
                PlatformRun::Aborted(reasons) => {
                    result.aborted.insert(platform, reasons);
                }
                PlatformRun::Failed(message) => {
                    result.failed.insert(platform, message);
                }
                PlatformRun::Skipped => result.skipped.push(platform),
            }
        }

        result.success =
            result.failed.is_empty() && result.aborted.is_empty() && result.skipped.is_empty();

        Self::log_summary(&result);
        result
    }

    async fn run_sequentially(&self, options: &BatchPublishOptions) -> Vec<(Platform, PlatformRun)> {
        let mut runs = Vec::with_capacity(self.publishers.len());
        let mut halted = false;

        for publisher in &self.publishers {
            let platform = publisher.platform();
            if halted {
                warn!(platform = %platform, "Skipping due to previous failure");
                runs.push((platform, PlatformRun::Skipped));
                continue;
            }

            let run = Self::run_one(publisher.as_ref(), options.dry_run).await;
            if matches!(run, PlatformRun::Failed(_)) && !options.continue_on_error {
                halted = true;
            }
            runs.push((platform, run));
        }

        runs
    }

    async fn run_in_parallel(&self, options: &BatchPublishOptions) -> Vec<(Platform, PlatformRun)> {
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        let halted = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::with_capacity(self.publishers.len());

        for publisher in &self.publishers {
            let publisher = Arc::clone(publisher);
            let semaphore = Arc::clone(&semaphore);
            let halted = Arc::clone(&halted);
            let dry_run = options.dry_run;
            let continue_on_error = options.continue_on_error;
            let platform = publisher.platform();

            let task = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => return PlatformRun::Failed(format!("Scheduling failed: {}", e)),
                };

                if halted.load(Ordering::SeqCst) {
                    warn!(platform = %publisher.platform(), "Skipping due to previous failure");
                    return PlatformRun::Skipped;
                }

                let run = Self::run_one(publisher.as_ref(), dry_run).await;
                if matches!(run, PlatformRun::Failed(_)) && !continue_on_error {
                    halted.store(true, Ordering::SeqCst);
                }
                run
            });

            tasks.push((platform, task));
        }

        let mut runs = Vec::with_capacity(tasks.len());
        for (platform, task) in tasks {
            let run = match task.await {
                Ok(run) => run,
                Err(e) => {
                    error!(platform = %platform, "Task failed: {}", e);
                    PlatformRun::Failed(format!("Task failed: {}", e))
                }
            };
            runs.push((platform, run));
        }

        runs
    }

    async fn run_one(publisher: &dyn PlatformPublisher, dry_run: bool) -> PlatformRun {
        let platform = publisher.platform();
        info!(platform = %platform, "Publishing to {}", platform.display_name());

        if dry_run {
            return match publisher.dry_run().await {
                Ok(report) => PlatformRun::DryRun(report),
                Err(e) => {
                    error!(platform = %platform, error_code = e.code(), "{}", e);
                    PlatformRun::Failed(e.to_string())
                }
            };
        }

        match publisher.publish().await {
            Ok(PublishOutcome::Published { response }) => {
                info!(platform = %platform, "Published successfully");
                PlatformRun::Published(response)
            }
            Ok(PublishOutcome::Aborted { reasons }) => PlatformRun::Aborted(reasons),
            Err(e) => {
                error!(platform = %platform, error_code = e.code(), "{}", e);
                for action in e.suggested_actions() {
                    info!(platform = %platform, "hint: {}", action);
                }
                PlatformRun::Failed(e.to_string())
            }
        }
    }

    fn log_summary(result: &BatchPublishResult) {
        info!("Batch publish summary");
        info!("  Succeeded: {}", result.succeeded.len());
        for platform in &result.succeeded {
            info!("    - {}", platform);
        }

        if !result.aborted.is_empty() {
            warn!("  Aborted: {}", result.aborted.len());
            for (platform, reasons) in &result.aborted {
                warn!("    - {}: {}", platform, reasons.join("; "));
            }
        }

        if !result.failed.is_empty() {
            error!("  Failed: {}", result.failed.len());
            for (platform, message) in &result.failed {
                error!("    - {}: {}", platform, message);
            }
        }

        if !result.skipped.is_empty() {
            warn!("  Skipped: {}", result.skipped.len());
            for platform in &result.skipped {
                warn!("    - {}", platform);
            }
        }

        info!(
            "Overall status: {}",
            if result.success { "SUCCESS" } else { "FAILED" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PublishError;
    use crate::core::traits::ValidationResult;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Publish,
        Abort,
        Fail,
    }

    struct FakePublisher {
        platform: Platform,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl FakePublisher {
        fn new(platform: Platform, behaviour: Behaviour) -> (Arc<dyn PlatformPublisher>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let publisher = Arc::new(Self {
                platform,
                behaviour,
                calls: Arc::clone(&calls),
            });
            (publisher, calls)
        }
    }

    #[async_trait]
    impl PlatformPublisher for FakePublisher {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn validate(&self) -> ValidationResult {
            ValidationResult::default()
        }

        async fn dry_run(&self) -> Result<DryRunResult, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DryRunResult {
                platform: self.platform,
                resolved_versions: vec!["1.20.1".to_string()],
                metadata: Some("{}".to_string()),
                files: Vec::new(),
                aborted: match self.behaviour {
                    Behaviour::Abort => vec!["token: missing".to_string()],
                    _ => Vec::new(),
                },
            })
        }

        async fn publish(&self) -> Result<PublishOutcome, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Publish => Ok(PublishOutcome::Published { response: None }),
                Behaviour::Abort => Ok(PublishOutcome::Aborted {
                    reasons: vec!["token: missing".to_string()],
                }),
                Behaviour::Fail => Err(PublishError::Upload {
                    platform: self.platform,
                    status: Some(500),
                    message: "Internal Server Error".to_string(),
                    body: Some("server error".to_string()),
                }),
            }
        }
    }

    #[test]
    fn test_batch_options_default() {
        let options = BatchPublishOptions::default();
        assert!(options.sequential);
        assert!(options.continue_on_error);
        assert_eq!(options.max_concurrency, 2);
        assert!(!options.dry_run);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_others_by_default() {
        let (first, _) = FakePublisher::new(Platform::Curseforge, Behaviour::Fail);
        let (second, second_calls) = FakePublisher::new(Platform::Modrinth, Behaviour::Publish);

        let batch = BatchPublisher::new(vec![first, second]);
        let result = batch.publish_all(&BatchPublishOptions::default()).await;

        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.succeeded, vec![Platform::Modrinth]);
        assert!(result.failed[&Platform::Curseforge].contains("500"));
        assert!(result.skipped.is_empty());
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_failures_listed_in_platform_order() {
        let (first, _) = FakePublisher::new(Platform::Modrinth, Behaviour::Fail);
        let (second, _) = FakePublisher::new(Platform::Curseforge, Behaviour::Fail);

        let result = BatchPublisher::new(vec![first, second])
            .publish_all(&BatchPublishOptions::default())
            .await;

        let platforms: Vec<Platform> = result.failed.keys().copied().collect();
        assert_eq!(platforms, vec![Platform::Curseforge, Platform::Modrinth]);
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining() {
        let (first, _) = FakePublisher::new(Platform::Curseforge, Behaviour::Fail);
        let (second, second_calls) = FakePublisher::new(Platform::Modrinth, Behaviour::Publish);

        let options = BatchPublishOptions {
            continue_on_error: false,
            ..Default::default()
        };
        let result = BatchPublisher::new(vec![first, second]).publish_all(&options).await;

        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.skipped, vec![Platform::Modrinth]);
        assert!(result.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_abort_never_stops_batch() {
        let (first, _) = FakePublisher::new(Platform::Curseforge, Behaviour::Abort);
        let (second, second_calls) = FakePublisher::new(Platform::Modrinth, Behaviour::Publish);

        let options = BatchPublishOptions {
            continue_on_error: false,
            ..Default::default()
        };
        let result = BatchPublisher::new(vec![first, second]).publish_all(&options).await;

        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.aborted[&Platform::Curseforge], vec!["token: missing"]);
        assert_eq!(result.succeeded, vec![Platform::Modrinth]);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_parallel_all_succeed() {
        let (first, first_calls) = FakePublisher::new(Platform::Curseforge, Behaviour::Publish);
        let (second, second_calls) = FakePublisher::new(Platform::Modrinth, Behaviour::Publish);

        let options = BatchPublishOptions {
            sequential: false,
            ..Default::default()
        };
        let result = BatchPublisher::new(vec![first, second]).publish_all(&options).await;

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.succeeded, vec![Platform::Curseforge, Platform::Modrinth]);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_dry_run_collects_reports() {
        let (first, _) = FakePublisher::new(Platform::Curseforge, Behaviour::Abort);
        let (second, _) = FakePublisher::new(Platform::Modrinth, Behaviour::Publish);

        let options = BatchPublishOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = BatchPublisher::new(vec![first, second]).publish_all(&options).await;

        assert_eq!(result.dry_runs.len(), 2);
        assert_eq!(result.succeeded, vec![Platform::Modrinth]);
        assert!(result.aborted.contains_key(&Platform::Curseforge));
    }
}
