use super::{error, reload_networkd, Result};
use crate::interface_id::InterfaceName;
use crate::networkd::{self, config::WriteOutcome};
use argh::FromArgs;
use snafu::ResultExt;
use std::path::Path;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "remove")]
/// Remove the systemd-networkd config written for an interface
pub(crate) struct RemoveArgs {
    #[argh(positional)]
    /// name of the network interface
    interface: InterfaceName,

    #[argh(switch)]
    /// reload systemd-networkd if any file was removed
    reload: bool,
}

pub(crate) fn run(args: RemoveArgs, config_dir: &Path) -> Result<()> {
    let removed = networkd::remove_port_files(config_dir, &args.interface)
        .context(error::NetworkDConfigRemoveSnafu)?;

    if removed.is_empty() {
        info!("No config found for '{}'", args.interface);
        return Ok(());
    }
    for path in &removed {
        println!("{}: {}", path.display(), WriteOutcome::Removed);
    }

    if args.reload {
        reload_networkd()?;
    }
    Ok(())
}
