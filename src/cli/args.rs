//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Phylogeny tools for the Numeralbank dataset: prune, inspect and annotate trees
#[derive(Parser, Debug)]
#[command(name = "numeralbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (multiple -d increase the level)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory with a local .numeralbank.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work on bare Newick files
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Render the phylogeny of a dataset snapshot
    Phylogeny {
        #[command(subcommand)]
        command: PhylogenyCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Tree subcommands
#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Prune a tree to the given names and print it as Newick
    Prune {
        /// Newick file ("-" reads stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Node names to keep
        #[arg(short, long = "keep", num_args = 1.., required = true)]
        keep: Vec<String>,
    },

    /// Show a tree, optionally pruned, as an indented diagram
    Show {
        /// Newick file ("-" reads stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Node names to keep
        #[arg(short, long = "keep", num_args = 1..)]
        keep: Vec<String>,
    },

    /// List leaf names in tree order
    Leaves {
        /// Newick file ("-" reads stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

/// Phylogeny subcommands
#[derive(Subcommand, Debug)]
pub enum PhylogenyCommands {
    /// Print the display tree: full without parameters, pruned otherwise
    Newick {
        /// Dataset snapshot (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        dataset: PathBuf,

        /// Selected parameter ids
        #[arg(short, long = "parameter", num_args = 1..)]
        parameter: Vec<String>,
    },

    /// Print marker metadata for each label of the display tree as JSON
    Labels {
        /// Dataset snapshot (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        dataset: PathBuf,

        /// Selected parameter id
        #[arg(short, long)]
        parameter: Option<String>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Print a commented config template
    Template,

    /// Show config file locations
    Path,
}
