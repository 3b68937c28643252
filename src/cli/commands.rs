//! Command dispatch: one handler per subcommand

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{prune_text, PhylogenyService};
use crate::application::ApplicationError;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, PhylogenyCommands, TreeCommands,
};
use crate::cli::output;
use crate::cli::render::TreeNodeConvert;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{newick, prune, DisplayAnnotation, DomainError, ScopeSet, TreeArena};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;
    let settings = Settings::load(Some(&config_dir))?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { command } => execute_tree(&container, command),
        Commands::Phylogeny { command } => execute_phylogeny(&container, command),
        Commands::Config { command } => execute_config(&container, &config_dir, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_config_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("get current directory", e))),
    }
}

/// Newick text from a file, or stdin for `-`.
fn read_newick(container: &ServiceContainer, file: &Path) -> CliResult<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| InfraError::io("read stdin", e))?;
        return Ok(text);
    }
    Ok(container.dataset_service().read_tree(file)?)
}

/// Relative dataset paths not found from the cwd are looked up in `data_dir`.
fn resolve_dataset(container: &ServiceContainer, dataset: &Path) -> PathBuf {
    if dataset.is_relative() && !container.fs.exists(dataset) {
        let candidate = container.settings.data_dir.join(dataset);
        debug!("dataset not in cwd, trying {}", candidate.display());
        return candidate;
    }
    dataset.to_path_buf()
}

fn parse_tree(text: &str) -> CliResult<TreeArena> {
    newick::parse(text)
        .map_err(|e| CliError::from(ApplicationError::Domain(DomainError::from(e))))
}

// ============================================================
// Tree commands
// ============================================================

fn execute_tree(container: &ServiceContainer, cmd: &TreeCommands) -> CliResult<()> {
    match cmd {
        TreeCommands::Prune { file, keep } => cmd_tree_prune(container, file, keep),
        TreeCommands::Show { file, keep } => cmd_tree_show(container, file, keep),
        TreeCommands::Leaves { file } => cmd_tree_leaves(container, file),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree_prune(container: &ServiceContainer, file: &Path, keep: &[String]) -> CliResult<()> {
    let text = read_newick(container, file)?;
    let scope = ScopeSet::from_names(keep.iter().cloned());
    let pruned = prune_text(&text, &scope);
    if pruned.is_empty() {
        output::warning("tree unavailable: malformed or no kept name occurs in it");
    } else {
        output::info(&pruned);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree_show(container: &ServiceContainer, file: &Path, keep: &[String]) -> CliResult<()> {
    let text = read_newick(container, file)?;
    let mut tree = parse_tree(&text)?;
    if !keep.is_empty() {
        let targets = ScopeSet::from_names(keep.iter().cloned()).targets(&tree);
        if targets.is_empty() {
            return Err(CliError::InvalidArgs(format!(
                "none of {} occurs in the tree",
                keep.join(", ")
            )));
        }
        let closure = prune(&mut tree, &targets).map_err(ApplicationError::from)?;
        debug!("kept {} nodes", closure.kept.len());
    }
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree_leaves(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let text = read_newick(container, file)?;
    let tree = parse_tree(&text)?;
    for name in tree.leaf_names() {
        output::info(&name);
    }
    Ok(())
}

// ============================================================
// Phylogeny commands
// ============================================================

fn execute_phylogeny(container: &ServiceContainer, cmd: &PhylogenyCommands) -> CliResult<()> {
    match cmd {
        PhylogenyCommands::Newick { dataset, parameter } => {
            cmd_phylogeny_newick(container, dataset, parameter)
        }
        PhylogenyCommands::Labels { dataset, parameter } => {
            cmd_phylogeny_labels(container, dataset, parameter.as_deref())
        }
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_phylogeny_newick(
    container: &ServiceContainer,
    dataset: &Path,
    parameters: &[String],
) -> CliResult<()> {
    let dataset = container
        .dataset_service()
        .load(&resolve_dataset(container, dataset))?;
    let service =
        PhylogenyService::new(&dataset, parameters, container.settings.display.clone())?;
    let newick = service.newick();
    if newick.is_empty() {
        output::warning("no tree available for this selection");
    } else {
        output::info(&newick);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_phylogeny_labels(
    container: &ServiceContainer,
    dataset: &Path,
    parameter: Option<&str>,
) -> CliResult<()> {
    let dataset = container
        .dataset_service()
        .load(&resolve_dataset(container, dataset))?;
    let parameters: Vec<String> = parameter.map(str::to_string).into_iter().collect();
    let service =
        PhylogenyService::new(&dataset, &parameters, container.settings.display.clone())?;
    let pindex = parameter.map(|_| 0);

    let annotations: Vec<DisplayAnnotation> = service
        .displayed_labels()
        .iter()
        .map(|label| service.label_properties(label, pindex))
        .collect();
    let json = serde_json::to_string_pretty(&annotations).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize annotations".to_string(),
            source: Box::new(e),
        }
    })?;
    output::info(&json);
    Ok(())
}

// ============================================================
// Config commands
// ============================================================

fn execute_config(
    container: &ServiceContainer,
    config_dir: &Path,
    cmd: &ConfigCommands,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", &"(no config directory on this platform)"),
            }
            output::action("local", &local_config_path(config_dir).display());
            output::detail(&"env: NUMERALBANK_* (use __ for nested keys)");
            Ok(())
        }
    }
}
