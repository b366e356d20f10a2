use super::{error, Result};
use crate::interface_id::InterfaceName;
use crate::{networkd, port_config};
use argh::FromArgs;
use snafu::{OptionExt, ResultExt};
use std::path::Path;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "show")]
/// Print the port declaration matching an interface's existing config
pub(crate) struct ShowArgs {
    #[argh(positional)]
    /// name of the network interface
    interface: InterfaceName,
}

/// Read the config files for the interface and print them as a declaration, which can be pasted
/// into a declaration file as-is.
pub(crate) fn run(args: ShowArgs, config_dir: &Path) -> Result<()> {
    let port = networkd::read_port(config_dir, &args.interface)
        .context(error::ExistingConfigSnafu {
            interface: args.interface.to_string(),
        })?
        .context(error::MissingConfigSnafu {
            interface: args.interface.to_string(),
            path: config_dir,
        })?;

    let declaration = port_config::to_toml(&[port]).context(error::PortDeclarationSnafu)?;
    print!("{}", declaration);
    Ok(())
}
