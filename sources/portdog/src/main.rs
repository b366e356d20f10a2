/*!
# Introduction

portdog writes systemd-networkd configuration for the ports of a Linux network switch, so a port
can be declared an "access" or a "trunk" port without hand-editing per-interface config files.

Ports are declared in a TOML file or with repeated `--port` arguments:
* `NAME:access:VLAN`: untagged traffic in a single VLAN.
* `NAME:trunk:VLANS[:NATIVE]`: tagged traffic in `VLANS` (e.g. `10,20,30-32`), and optionally
  untagged traffic in the `NATIVE` VLAN.

For every port, `20-NAME.network` enslaves the port to its bridge and sets its `[BridgeVLAN]`
membership.  `00-NAME.link` is only written if the port pins a MAC address or sets an alias, and
is removed again once it doesn't.

It contains these subcommands:
* `apply`: write (or with `--dry-run`, compare) the config for the declared ports.  Files are only
  written when their content changes.
* `show`: print the declaration matching an interface's existing config.
* `commands`: print the `ip`/`bridge` commands that apply the declared ports immediately.
* `remove`: remove the config written for an interface.
*/

#![deny(rust_2018_idioms)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_plain;

mod cli;
mod interface_id;
mod iproute2;
mod networkd;
mod port;
mod port_config;
mod vlan_id;

use argh::FromArgs;
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};
use snafu::ResultExt;
use std::path::PathBuf;
use std::process;

static NETWORKD_CONFIG_DIR: &str = "/etc/systemd/network";
static NETWORKCTL_BIN: &str = "/usr/bin/networkctl";

/// Declare switch port roles as systemd-networkd config
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    /// log-level trace|debug|info|warn|error
    #[argh(option)]
    log_level: Option<LevelFilter>,

    /// directory watched by systemd-networkd
    #[argh(option, default = "PathBuf::from(NETWORKD_CONFIG_DIR)")]
    config_dir: PathBuf,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Apply(cli::ApplyArgs),
    Show(cli::ShowArgs),
    Commands(cli::CommandsArgs),
    Remove(cli::RemoveArgs),
}

fn setup_logger(args: &Args) -> Result<()> {
    let log_level = args.log_level.unwrap_or(LevelFilter::Info);
    SimpleLogger::init(log_level, LogConfig::default()).context(error::LoggerSnafu)
}

fn run() -> Result<()> {
    let args: Args = argh::from_env();
    setup_logger(&args)?;

    let config_dir = &args.config_dir;
    match args.subcommand {
        SubCommand::Apply(apply) => cli::apply::run(apply, config_dir),
        SubCommand::Show(show) => cli::show::run(show, config_dir),
        SubCommand::Commands(commands) => cli::commands::run(commands),
        SubCommand::Remove(remove) => cli::remove::run(remove, config_dir),
    }
    .context(error::SubCommandSnafu)
}

// Returning a Result from main makes it print a Debug representation of the error, but with Snafu
// we have nice Display representations of the error, so we wrap "main" (run) and print any error.
// https://github.com/shepmaster/snafu/issues/110
fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub(super) enum Error {
        #[snafu(display("Logger setup error: {}", source))]
        Logger { source: log::SetLoggerError },

        // The subcommands' errors are already descriptive
        #[snafu(display("{}", source))]
        SubCommand { source: crate::cli::Error },
    }
}

type Result<T> = std::result::Result<T, error::Error>;
