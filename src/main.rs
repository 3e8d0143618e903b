use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reposync::workspace::{self, HandleFactory};
use reposync::{
    ActivityEngine, ActivityLog, DiscoveredRepository, MainContext, RepositoryHandle,
    RepositoryRegistry, RepositoryScanner, RootWatcher, SerializedRepository, Settings, aggregate,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "reposync")]
#[command(about = "Watches a sync root and notifies each repository of changes in its tree")]
struct Cli {
    /// Settings file to load instead of the default location
    #[arg(long, global = true, env = "REPOSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default settings file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Show which repositories a set of root-relative paths would trigger
    Resolve {
        /// Paths relative to the sync root
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Watch the sync root until interrupted
    Watch {
        /// Sync root (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

/// Flushes stdout after each unit of main-context work.
struct FlushStdout;

impl Drop for FlushStdout {
    fn drop(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    reposync::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(&config_path, force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration ({}):", config_path.display());
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Resolve { paths } => {
            let triggered = aggregate(&paths);
            println!("{} path(s) -> {} repository(ies):", paths.len(), triggered.len());
            for id in &triggered {
                println!("  {id}");
            }
        }

        Commands::Watch { root } => {
            if let Some(root) = root {
                settings.root = root;
            }
            watch(settings)?;
        }
    }

    Ok(())
}

/// Run the watcher until Ctrl-C. The main thread becomes the main context.
fn watch(settings: Settings) -> Result<()> {
    let root = settings.root.clone();
    if workspace::ensure_root(&root)? {
        println!("Created sync root at {}", root.display());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("reposync-worker")
        .build()
        .context("failed to start tokio runtime")?;

    let (context, invoker) = MainContext::new();
    let context = context.with_scope(|| FlushStdout);
    let registry = Arc::new(RepositoryRegistry::new());

    let serialize = settings.repositories.serialize_activity;
    let handler_invoker = invoker.clone();
    let factory: HandleFactory = Arc::new(
        move |repository: &DiscoveredRepository| -> Arc<dyn RepositoryHandle> {
            let log = ActivityLog::new(repository).with_main_context(handler_invoker.clone());
            if serialize {
                SerializedRepository::new(log).into_handle()
            } else {
                Arc::new(log)
            }
        },
    );

    let scanner = RepositoryScanner::new(&root, Arc::clone(&registry), factory)
        .with_interval(settings.repositories.rescan_interval());
    scanner.sync_once()?;
    let repositories = registry.len();
    runtime.spawn(scanner.watch());

    let engine = ActivityEngine::new(registry, runtime.handle().clone());
    let mut watcher = RootWatcher::start(&root, settings.watcher.batch_window(), move |batch| {
        engine.on_batch(batch);
    })?;
    println!(
        "Watching {} ({repositories} repositories). Press Ctrl-C to stop.",
        watcher.root().display()
    );

    let interrupt = invoker.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            reposync::log_event!("reposync", "interrupted");
            let _ = interrupt.shutdown();
        }
    });
    drop(invoker);

    context.run();

    watcher.stop();
    runtime.shutdown_timeout(Duration::from_secs(5));
    Ok(())
}
