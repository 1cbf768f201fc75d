use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stow", about = "Stow: inspect object graphs in a file store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List stored ids, optionally filtered by a glob
    Ids(IdsArgs),
    /// Print a single stored record
    Show(ShowArgs),
    /// Save the sample family graph and print its model id
    Demo,
    /// Load a family model and print its ancestry
    Tree(TreeArgs),
}

#[derive(Args)]
pub struct IdsArgs {
    pub pattern: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct TreeArgs {
    pub id: String,
}
