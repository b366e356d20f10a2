use super::{declared_ports, error, reload_networkd, Result};
use crate::networkd::config::WriteOutcome;
use crate::networkd::{self, NetworkDConfig};
use argh::FromArgs;
use snafu::ResultExt;
use std::path::{Path, PathBuf};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "apply")]
/// Write systemd-networkd config for the declared ports
pub(crate) struct ApplyArgs {
    #[argh(positional)]
    /// port declaration file
    declaration: Option<PathBuf>,

    #[argh(option)]
    /// port definition, NAME:access:VLAN or NAME:trunk:VLANS[:NATIVE]; may be repeated
    port: Vec<String>,

    #[argh(option)]
    /// bridge all --port definitions are enslaved to
    bridge: Option<String>,

    #[argh(switch)]
    /// only report what would change
    dry_run: bool,

    #[argh(switch)]
    /// reload systemd-networkd if any file changed
    reload: bool,
}

/// Write config for every declared port.  Everything is validated before anything is written.
pub(crate) fn run(args: ApplyArgs, config_dir: &Path) -> Result<()> {
    let ports = declared_ports(
        args.declaration.as_deref(),
        &args.port,
        args.bridge.as_deref(),
    )?;
    networkd::ensure_config_dir(config_dir).context(error::NetworkDConfigWriteSnafu)?;

    let changed = apply(NetworkDConfig::new(ports), config_dir, args.dry_run)?;

    if !args.reload {
        return Ok(());
    }
    if args.dry_run {
        info!("Dry run, not reloading systemd-networkd");
    } else if changed {
        reload_networkd()?;
    } else {
        info!("No config changed, not reloading systemd-networkd");
    }
    Ok(())
}

/// Write (or with `dry_run`, compare) each config file and report the outcome.  .link files the
/// declaration no longer calls for are removed.  Returns whether any file changed.
fn apply(config: NetworkDConfig, config_dir: &Path, dry_run: bool) -> Result<bool> {
    let mut changed = false;

    for file in config.create_files() {
        let path = file
            .config_path(config_dir)
            .context(error::NetworkDConfigWriteSnafu)?;

        if dry_run {
            let outcome = file
                .pending_outcome(config_dir)
                .context(error::NetworkDConfigWriteSnafu)?;
            println!("{}: would be {}", path.display(), outcome);
            if outcome.is_change() {
                print!("{}", file.render());
                changed = true;
            }
        } else {
            let outcome = file
                .write_config_file(config_dir)
                .context(error::NetworkDConfigWriteSnafu)?;
            println!("{}: {}", path.display(), outcome);
            changed |= outcome.is_change();
        }
    }

    for path in config.stale_files(config_dir) {
        if dry_run {
            println!("{}: would be {}", path.display(), WriteOutcome::Removed);
            changed = true;
        } else if networkd::remove_config_file(&path).context(error::NetworkDConfigRemoveSnafu)? {
            println!("{}: {}", path.display(), WriteOutcome::Removed);
            changed = true;
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port_config;
    use std::fs;

    fn config(definitions: &[&str]) -> NetworkDConfig {
        NetworkDConfig::new(port_config::from_definitions(definitions, None).unwrap())
    }

    #[test]
    fn apply_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(apply(config(&["swp1:access:10"]), dir.path(), false).unwrap());
        assert!(!apply(config(&["swp1:access:10"]), dir.path(), false).unwrap());
        assert!(apply(config(&["swp1:access:20"]), dir.path(), false).unwrap());
    }

    fn with_alias(alias: Option<&str>) -> NetworkDConfig {
        let mut ports = port_config::from_definitions(&["swp1:access:10"], None).unwrap();
        ports[0].alias = alias.map(str::to_string);
        NetworkDConfig::new(ports)
    }

    #[test]
    fn apply_removes_dropped_link() {
        let dir = tempfile::tempdir().unwrap();
        let link_path = dir.path().join("00-swp1.link");
        assert!(apply(with_alias(Some("old uplink")), dir.path(), false).unwrap());
        assert!(link_path.exists());

        // A dry run reports the removal but leaves the file
        assert!(apply(with_alias(None), dir.path(), true).unwrap());
        assert!(link_path.exists());

        assert!(apply(with_alias(None), dir.path(), false).unwrap());
        assert!(!link_path.exists());
        assert!(!apply(with_alias(None), dir.path(), false).unwrap());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(apply(config(&["swp1:access:10"]), dir.path(), true).unwrap());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_declaration_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let args = ApplyArgs {
            declaration: None,
            port: vec!["swp1:access:10".to_string(), "swp2:access:4095".to_string()],
            bridge: None,
            dry_run: false,
            reload: false,
        };
        assert!(run(args, dir.path()).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let args = ApplyArgs {
            declaration: None,
            port: vec!["swp1:access:10".to_string()],
            bridge: None,
            dry_run: false,
            reload: false,
        };
        assert!(run(args, &dir.path().join("network")).is_err());
        assert!(!dir.path().join("network").exists());
    }
}
