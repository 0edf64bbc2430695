use anyhow::Context;
use colored::Colorize;
use plat_sdk::{HostRecord, Platform, PlatformConfig, SdkError};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => PlatformConfig::load(path).map_err(failure)?,
        None => PlatformConfig::default(),
    };
    debug!(config = ?cli.config, "loaded configuration");
    let platform = Platform::from_config(&config).map_err(failure)?;
    let output = execute(&platform, cli.command, cli.format)?;
    println!("{output}");
    Ok(())
}

fn execute(platform: &Platform, command: Command, format: OutputFormat) -> anyhow::Result<String> {
    match command {
        Command::Fullpath(args) => cmd_fullpath(platform, args, format),
        Command::Mkdir(args) => cmd_mkdir(platform, args, format),
        Command::Resolve(args) => cmd_resolve(platform, args, format),
        Command::Reg(args) => match args.action {
            RegAction::Read { key, name, max } => cmd_reg_read(platform, &key, &name, max, format),
            RegAction::Write { key, name, value } => {
                cmd_reg_write(platform, &key, name.as_deref(), value.as_deref(), format)
            }
        },
    }
}

fn failure(e: SdkError) -> anyhow::Error {
    anyhow::anyhow!("{} {}", e.code(), e)
}

fn cmd_fullpath(platform: &Platform, args: FullpathArgs, format: OutputFormat) -> anyhow::Result<String> {
    let full = platform
        .full_path_within(&args.path, args.capacity)
        .map_err(failure)?;
    Ok(match format {
        OutputFormat::Json => json!({ "path": args.path, "full_path": full }).to_string(),
        OutputFormat::Text => full,
    })
}

fn cmd_mkdir(platform: &Platform, args: MkdirArgs, format: OutputFormat) -> anyhow::Result<String> {
    platform.make_dir_path(&args.path).map_err(failure)?;
    Ok(match format {
        OutputFormat::Json => json!({ "path": args.path, "created": true }).to_string(),
        OutputFormat::Text => format!("{} {}", "✓".green().bold(), args.path.bold()),
    })
}

fn cmd_resolve(platform: &Platform, args: ResolveArgs, format: OutputFormat) -> anyhow::Result<String> {
    let record = platform
        .resolve_host(&args.name)
        .with_context(|| format!("cannot resolve {}", args.name))?;
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&record)?,
        OutputFormat::Text => render_host(&record),
    })
}

fn render_host(record: &HostRecord) -> String {
    let mut out = format!("{} ({})", record.name.bold(), record.family);
    for addr in record.ip_addrs() {
        out.push_str(&format!("\n  address: {}", addr.to_string().cyan()));
    }
    for alias in &record.aliases {
        out.push_str(&format!("\n  alias: {}", alias.yellow()));
    }
    out
}

fn cmd_reg_read(
    platform: &Platform,
    key: &str,
    name: &str,
    max: usize,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let value = platform
        .read_config_within(max, key, name)
        .map_err(failure)?;
    Ok(match format {
        OutputFormat::Json => json!({ "key": key, "name": name, "value": value }).to_string(),
        OutputFormat::Text => value,
    })
}

fn cmd_reg_write(
    platform: &Platform,
    key: &str,
    name: Option<&str>,
    value: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    platform
        .write_config(key, name, value.unwrap_or_default())
        .map_err(failure)?;
    Ok(match (format, name) {
        (OutputFormat::Json, _) => json!({ "key": key, "name": name, "value": value }).to_string(),
        (OutputFormat::Text, Some(name)) => {
            format!("{} {}\\{} = {}", "✓".green().bold(), key.bold(), name.yellow(), value.unwrap_or_default())
        }
        (OutputFormat::Text, None) => format!("{} created {}", "✓".green().bold(), key.bold()),
    })
}
