//! Mod Publisher CLI
//!
//! Uploads built mod artifacts to CurseForge and Modrinth

use anyhow::Result;
use clap::{Parser, Subcommand};
use mod_publisher::core::config::PublishConfig;
use mod_publisher::core::config_loader::{ConfigLoadOptions, ConfigLoader};
use mod_publisher::{
    BatchPublishOptions, BatchPublisher, Platform, PluginLoader, SecureTokenManager,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Publish mod releases to CurseForge and Modrinth
#[derive(Parser)]
#[command(name = "mod-publisher")]
#[command(version)]
#[command(about = "Publish mod releases to CurseForge and Modrinth", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the configured release
    Publish {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Platform to publish to (repeatable; defaults to every enabled platform)
        #[arg(short, long = "platform", value_name = "PLATFORM")]
        platforms: Vec<Platform>,

        /// Configuration file (defaults to PROJECT_PATH/.mod-publisher.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Resolve versions and print metadata without uploading
        #[arg(long)]
        dry_run: bool,

        /// Publish to platforms concurrently
        #[arg(long)]
        parallel: bool,

        /// Skip remaining platforms after the first failure
        #[arg(long)]
        fail_fast: bool,
    },

    /// Check configuration and publishers without touching the network
    Check {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Configuration file (defaults to PROJECT_PATH/.mod-publisher.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            let masked = SecureTokenManager::new().mask_tokens_in_string(&format!("{:#}", e));
            eprintln!("\n❌ Error");
            eprintln!("{}", masked);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Publish {
            project_path,
            platforms,
            config,
            dry_run,
            parallel,
            fail_fast,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            let options = BatchPublishOptions {
                sequential: !parallel,
                continue_on_error: !fail_fast,
                dry_run,
                ..Default::default()
            };
            publish_command(path, config, platforms, options).await
        }
        Commands::Check {
            project_path,
            config,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            check_command(path, config).await
        }
    }
}

async fn load_config(project_path: PathBuf, config_path: Option<PathBuf>) -> Result<PublishConfig> {
    let mut options = ConfigLoadOptions::new(project_path);
    options.config_path = config_path;
    Ok(ConfigLoader::load(options).await?)
}

/// Tokens from the loaded configuration, for masking error output
fn config_secrets(config: &PublishConfig) -> Vec<SecretString> {
    let curseforge = config
        .platforms
        .curseforge
        .as_ref()
        .and_then(|c| c.token.as_deref());
    let modrinth = config
        .platforms
        .modrinth
        .as_ref()
        .and_then(|c| c.token.as_deref());

    [curseforge, modrinth]
        .into_iter()
        .filter_map(SecureTokenManager::secret_from)
        .collect()
}

async fn publish_command(
    project_path: PathBuf,
    config_path: Option<PathBuf>,
    platforms: Vec<Platform>,
    options: BatchPublishOptions,
) -> Result<i32> {
    println!("\n📦 mod-publisher{}\n", if options.dry_run { " (dry run)" } else { "" });

    let config = load_config(project_path, config_path).await?;
    let validation = ConfigLoader::validate(&config);
    if !validation.valid {
        eprintln!("{}", ConfigLoader::format_validation_result(&validation));
        return Ok(1);
    }

    let loader = PluginLoader::new()?;
    let publishers = loader.load_publishers(&config, &platforms)?;
    if publishers.is_empty() {
        eprintln!("⚠️  No enabled platforms configured");
        return Ok(1);
    }

    let result = BatchPublisher::new(publishers).publish_all(&options).await;

    for report in &result.dry_runs {
        println!("\n🔍 {}", report.platform.display_name());
        println!("  Game versions: {}", report.resolved_versions.join(", "));
        for file in &report.files {
            println!("  File: {}", file.display());
        }
        if let Some(metadata) = &report.metadata {
            println!("  Metadata: {}", metadata);
        }
        for reason in &report.aborted {
            println!("  ❌ {}", reason);
        }
    }

    if !result.failed.is_empty() {
        let manager = SecureTokenManager::new();
        let secrets = config_secrets(&config);
        for (platform, message) in &result.failed {
            eprintln!("  - {}: {}", platform, manager.mask_secrets(message, &secrets));
        }
    }

    if result.success {
        println!("\n✅ Publishing completed successfully!");
        Ok(0)
    } else {
        println!("\n❌ Publishing completed with errors");
        Ok(1)
    }
}

async fn check_command(project_path: PathBuf, config_path: Option<PathBuf>) -> Result<i32> {
    println!("\n🔍 Release Check\n");

    let config = load_config(project_path, config_path).await?;
    let validation = ConfigLoader::validate(&config);
    println!("{}", ConfigLoader::format_validation_result(&validation));

    let loader = PluginLoader::new()?;
    let publishers = loader.load_publishers(&config, &[])?;
    if publishers.is_empty() {
        println!("⚠️  No enabled platforms configured");
        return Ok(1);
    }

    let mut ready = validation.valid;
    for publisher in publishers {
        let result = publisher.validate();
        println!("\n📦 {}:", publisher.platform().display_name());

        for warning in &result.warnings {
            println!("  ⚠️  {}: {}", warning.field, warning.message);
        }
        for error in &result.errors {
            println!("  ❌ {}: {}", error.field, error.message);
        }
        if result.valid {
            println!("  ✅ Ready to publish");
        } else {
            ready = false;
        }
    }

    Ok(if ready { 0 } else { 1 })
}
