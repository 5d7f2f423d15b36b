//! deckhand - pull files from and deploy files to configured targets
//!
//! A small command line tool that runs the target's operation hooks around
//! each deployment and hands the actual transfer to the plugin matching the
//! target's type.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use deckhand_config::{Config, ConfigLoader, LoggingConfig};
use deckhand_engine::{find_targets_by_name, unknown_target_names, DeployEngine};
use deckhand_types::{Target, Workspace, OPEN_OPERATION_TYPE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use deckhand_cli::display::{display_config, display_targets, ConsoleSink};
use deckhand_cli::json_output::TargetsJson;
use deckhand_cli::{LocalPlugin, LocalWorkspace, OpenExecutor, TerminalUi, TokioFileSystem};

/// deckhand - pull files from and deploy files to configured targets
#[derive(Parser)]
#[command(
    name = "deckhand",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pull files from and deploy files to configured targets",
    long_about = "deckhand transfers workspace files to and from the targets defined in\n\
                  its configuration. Targets can run operations before and after a\n\
                  deployment, and the transfer itself is done by the plugin matching\n\
                  the target's type."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace root (defaults to the configured root or the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull files from a target
    Pull {
        /// Files to pull, inside the workspace
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target name to choose from (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },
    /// Deploy files to a target
    Deploy {
        /// Files to deploy, inside the workspace
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target name to choose from (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },
    /// List the configured targets
    Targets {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the shown configuration to a file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize logging
    init_logging(cli.debug, cli.quiet, cli.verbose, &config.logging);

    info!("deckhand v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Pull { files, targets } => {
            let workspace = open_workspace(cli.root, &config, cli.quiet)?;
            pull_command(workspace, &config, files, targets).await?;
        }
        Commands::Deploy { files, targets } => {
            let workspace = open_workspace(cli.root, &config, cli.quiet)?;
            deploy_command(workspace, &config, files, targets).await?;
        }
        Commands::Targets { json } => {
            let workspace = open_workspace(cli.root, &config, cli.quiet)?;
            targets_command(&workspace, json)?;
        }
        Commands::Config { default, write } => {
            config_command(&config, default, write.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load_default()?,
    };
    Ok(config)
}

fn init_logging(debug: bool, quiet: bool, verbose: bool, logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(logging.colored_output)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_workspace(root: Option<PathBuf>, config: &Config, quiet: bool) -> Result<Arc<LocalWorkspace>> {
    let root = match root.or_else(|| config.workspace.root.clone()) {
        Some(root) => LocalWorkspace::absolutize(&root)?,
        None => std::env::current_dir()?,
    };

    let targets = config.materialize_targets(&LocalWorkspace::id_for(&root));
    info!(
        "Workspace {} with {} configured target(s)",
        root.display(),
        targets.len()
    );

    Ok(Arc::new(LocalWorkspace::new(
        root,
        targets,
        Box::new(ConsoleSink::new(quiet)),
    )))
}

fn build_engine(workspace: &Arc<LocalWorkspace>, config: &Config) -> Result<DeployEngine> {
    let engine = DeployEngine::builder(workspace.clone())
        .with_plugin(Arc::new(LocalPlugin::new(workspace.root_path().to_path_buf())))
        .with_executor(
            OPEN_OPERATION_TYPE,
            Arc::new(OpenExecutor::new(config.operations.open_command.clone())),
        )
        .with_file_system(Arc::new(TokioFileSystem))
        .with_user_interface(Arc::new(TerminalUi::new(
            config.ui.fuzzy_select,
            config.ui.show_workspace_path,
        )))
        .with_wait_limit(Duration::from_millis(config.operations.wait_max_ms))
        .build()?;

    watch_interrupt(Arc::clone(workspace));
    Ok(engine)
}

/// Finalize the workspace on Ctrl-C so running chains stop
fn watch_interrupt(workspace: Arc<LocalWorkspace>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            workspace.finalize();
        }
    });
}

/// Resolve the target names given on the command line.
///
/// `None` lets the engine choose among all targets. Fails when names were
/// given but none of them matches a target.
fn select_targets(workspace: &LocalWorkspace, names: &[String]) -> Result<Option<Vec<Arc<Target>>>> {
    if names.is_empty() {
        return Ok(None);
    }

    let targets = workspace.list_targets();
    for unknown in unknown_target_names(&targets, names) {
        eprintln!(
            "{} {}",
            style("⚠").yellow().bold(),
            style(workspace.translate("targets.notFound", &[unknown])).yellow()
        );
    }

    let found = find_targets_by_name(&targets, names);
    if found.is_empty() {
        anyhow::bail!("None of the requested targets exists: {}", names.join(", "));
    }
    Ok(Some(found))
}

fn absolute_files(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let files = files
        .iter()
        .map(|f| LocalWorkspace::absolutize(f))
        .collect::<deckhand_types::Result<Vec<_>>>()?;
    Ok(files)
}

async fn pull_command(
    workspace: Arc<LocalWorkspace>,
    config: &Config,
    files: Vec<PathBuf>,
    names: Vec<String>,
) -> Result<()> {
    let engine = build_engine(&workspace, config)?;
    let files = absolute_files(&files)?;

    info!("Pulling {} file(s)", files.len());
    engine
        .pull_files(&files, select_targets(&workspace, &names)?)
        .await?;
    Ok(())
}

async fn deploy_command(
    workspace: Arc<LocalWorkspace>,
    config: &Config,
    files: Vec<PathBuf>,
    names: Vec<String>,
) -> Result<()> {
    let engine = build_engine(&workspace, config)?;
    let files = absolute_files(&files)?;

    info!("Deploying {} file(s)", files.len());
    let completed = engine
        .deploy_files(&files, select_targets(&workspace, &names)?)
        .await?;

    if completed {
        info!("Deployment completed");
    } else {
        info!("Deployment did not complete");
    }
    Ok(())
}

fn targets_command(workspace: &LocalWorkspace, json: bool) -> Result<()> {
    let active = workspace.list_targets();

    if json {
        let listing = TargetsJson::new(workspace, workspace.all_targets(), &active);
        println!("{}", listing.to_json()?);
    } else {
        display_targets(workspace, workspace.all_targets(), &active);
    }
    Ok(())
}

fn config_command(config: &Config, default: bool, write: Option<&Path>) -> Result<()> {
    let (heading, shown) = if default {
        ("Default configuration:", Config::default())
    } else {
        ("Current configuration:", config.clone())
    };

    if let Some(path) = write {
        if default {
            ConfigLoader::generate_default_config(path)?;
        } else {
            ConfigLoader::save_to_file(&shown, path)?;
        }
        println!(
            "{} Configuration written to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
        return Ok(());
    }

    display_config(heading, &ConfigLoader::to_yaml(&shown)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_types::WorkspaceId;

    fn workspace() -> LocalWorkspace {
        let root = PathBuf::from("/srv/project");
        let id: WorkspaceId = LocalWorkspace::id_for(&root);
        let targets = vec![
            Arc::new(Target::new("Prod", "local").with_workspace(id.clone())),
            Arc::new(Target::new("Staging", "local").with_index(1).with_workspace(id)),
        ];
        LocalWorkspace::new(root, targets, Box::new(ConsoleSink::new(true)))
    }

    #[test]
    fn test_no_names_selects_from_all_targets() {
        assert!(select_targets(&workspace(), &[]).unwrap().is_none());
    }

    #[test]
    fn test_known_names_are_selected() {
        let names = vec!["staging ".to_string(), "nope".to_string()];
        let found = select_targets(&workspace(), &names).unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 1);
    }

    #[test]
    fn test_only_unknown_names_stop_the_command() {
        let names = vec!["nope".to_string()];
        let error = select_targets(&workspace(), &names).unwrap_err();
        assert!(error.to_string().contains("nope"));
    }

    #[test]
    fn test_cli_parses_repeated_targets() {
        let cli = Cli::try_parse_from(["deckhand", "deploy", "a.txt", "-t", "prod", "-t", "staging"])
            .unwrap();
        match cli.command {
            Commands::Deploy { files, targets } => {
                assert_eq!(files, vec![PathBuf::from("a.txt")]);
                assert_eq!(targets, vec!["prod", "staging"]);
            }
            _ => panic!("expected deploy"),
        }
    }
}
