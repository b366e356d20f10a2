use super::{declared_ports, Result};
use crate::iproute2;
use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "commands")]
/// Print the iproute2 commands that apply the declared ports immediately
pub(crate) struct CommandsArgs {
    #[argh(positional)]
    /// port declaration file
    declaration: Option<PathBuf>,

    #[argh(option)]
    /// port definition, NAME:access:VLAN or NAME:trunk:VLANS[:NATIVE]; may be repeated
    port: Vec<String>,

    #[argh(option)]
    /// bridge all --port definitions are enslaved to
    bridge: Option<String>,
}

pub(crate) fn run(args: CommandsArgs) -> Result<()> {
    let ports = declared_ports(
        args.declaration.as_deref(),
        &args.port,
        args.bridge.as_deref(),
    )?;

    for port in ports {
        for command in iproute2::port_commands(&port) {
            println!("{}", command);
        }
    }
    Ok(())
}
