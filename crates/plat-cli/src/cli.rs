use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use plat_types::{MAX_PATH, MAX_STRING};

#[derive(Parser)]
#[command(
    name = "plat",
    about = "Platform layer: paths, directories, hostnames, and the configuration store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file selecting the normalizer, registry, and resolver backends
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the absolute, forward-slash form of a path
    Fullpath(FullpathArgs),
    /// Create a directory and every missing parent
    Mkdir(MkdirArgs),
    /// Resolve a hostname
    Resolve(ResolveArgs),
    /// Read or write the configuration store
    Reg(RegArgs),
}

#[derive(Args)]
pub struct FullpathArgs {
    pub path: String,
    /// Output capacity in bytes, terminator included
    #[arg(long, default_value_t = MAX_PATH)]
    pub capacity: usize,
}

#[derive(Args)]
pub struct MkdirArgs {
    pub path: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub name: String,
}

#[derive(Args)]
pub struct RegArgs {
    #[command(subcommand)]
    pub action: RegAction,
}

#[derive(Subcommand)]
pub enum RegAction {
    /// Read a string value
    Read {
        key: String,
        name: String,
        /// Largest stored size accepted, terminator included
        #[arg(long, default_value_t = MAX_STRING)]
        max: usize,
    },
    /// Write a string value, or create the key when no name is given
    Write {
        key: String,
        #[arg(requires = "value")]
        name: Option<String>,
        value: Option<String>,
    },
}
