pub(crate) mod apply;
pub(crate) mod commands;
pub(crate) mod remove;
pub(crate) mod show;

use crate::port::Port;
use crate::port_config;
use crate::NETWORKCTL_BIN;
pub(crate) use apply::ApplyArgs;
pub(crate) use commands::CommandsArgs;
pub(crate) use remove::RemoveArgs;
pub(crate) use show::ShowArgs;
use snafu::{ensure, ResultExt};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

/// Gather the declared ports from either a declaration file or `--port` definitions.  Exactly one
/// of the two must be given; `bridge` only applies to `--port` definitions.
fn declared_ports<S>(
    declaration: Option<&Path>,
    definitions: &[S],
    bridge: Option<&str>,
) -> Result<Vec<Port>>
where
    S: AsRef<str>,
{
    match declaration {
        Some(path) => {
            ensure!(
                definitions.is_empty(),
                error::InvalidArgumentsSnafu {
                    reason: "give either a declaration file or --port definitions, not both",
                }
            );
            ensure!(
                bridge.is_none(),
                error::InvalidArgumentsSnafu {
                    reason: "--bridge only applies to --port definitions, set 'bridge' in the declaration file instead",
                }
            );
            port_config::from_path(path).context(error::PortConfigParseSnafu { path })
        }
        None => {
            ensure!(
                !definitions.is_empty(),
                error::InvalidArgumentsSnafu {
                    reason: "a declaration file or at least one --port definition is required",
                }
            );
            port_config::from_definitions(definitions, bridge)
                .context(error::PortDefinitionsSnafu)
        }
    }
}

/// Ask systemd-networkd to pick up changed config files
fn reload_networkd() -> Result<()> {
    info!("Reloading systemd-networkd");
    command(NETWORKCTL_BIN, ["reload"])?;
    Ok(())
}

/// Run a command, returning its stdout if it succeeded
fn command<I, S>(bin_path: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(bin_path);
    command.args(args);
    let output = command
        .output()
        .context(error::ExecutionFailureSnafu { command })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    trace!("stdout: {}", stdout);
    trace!("stderr: {}", String::from_utf8_lossy(&output.stderr));

    ensure!(
        output.status.success(),
        error::CommandFailureSnafu { bin_path, output }
    );

    Ok(stdout)
}

/// Potential errors during portdog execution
mod error {
    use crate::{networkd, port_config};
    use snafu::Snafu;
    use std::path::PathBuf;
    use std::process::{Command, Output};

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("'{}' failed - stderr: {}",
                        bin_path, String::from_utf8_lossy(&output.stderr)))]
        CommandFailure { bin_path: String, output: Output },

        #[snafu(display("Failed to execute '{:?}': {}", command, source))]
        ExecutionFailure {
            command: Command,
            source: std::io::Error,
        },

        #[snafu(display("Failed to read existing config for '{}': {}", interface, source))]
        ExistingConfig {
            interface: String,
            source: networkd::Error,
        },

        #[snafu(display("Invalid arguments: {}", reason))]
        InvalidArguments { reason: String },

        #[snafu(display("No config for '{}' found in '{}'", interface, path.display()))]
        MissingConfig { interface: String, path: PathBuf },

        #[snafu(display("Failed to write network configuration: {}", source))]
        NetworkDConfigWrite { source: networkd::Error },

        #[snafu(display("Failed to remove network configuration: {}", source))]
        NetworkDConfigRemove { source: networkd::Error },

        #[snafu(display("Unable to read/parse port declaration from '{}': {}", path.display(), source))]
        PortConfigParse {
            path: PathBuf,
            source: port_config::Error,
        },

        #[snafu(display("Invalid --port definitions: {}", source))]
        PortDefinitions { source: port_config::Error },

        #[snafu(display("Failed to render port declaration: {}", source))]
        PortDeclaration { source: port_config::Error },
    }
}

pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ports_toml() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("port_config")
            .join("ports.toml")
    }

    #[test]
    fn ports_from_file() {
        let none: &[&str] = &[];
        let ports = declared_ports(Some(&ports_toml()), none, None).unwrap();
        assert_eq!(ports.len(), 4);
    }

    #[test]
    fn ports_from_definitions() {
        let ports = declared_ports(None, &["swp1:access:10"], Some("br0")).unwrap();
        assert_eq!(ports[0].bridge.as_deref(), Some("br0"));
    }

    #[test]
    fn file_and_definitions_conflict() {
        assert!(matches!(
            declared_ports(Some(&ports_toml()), &["swp1:access:10"], None),
            Err(Error::InvalidArguments { .. })
        ))
    }

    #[test]
    fn file_and_bridge_conflict() {
        let none: &[&str] = &[];
        assert!(matches!(
            declared_ports(Some(&ports_toml()), none, Some("br0")),
            Err(Error::InvalidArguments { .. })
        ))
    }

    #[test]
    fn nothing_declared() {
        let none: &[&str] = &[];
        assert!(matches!(
            declared_ports(None, none, None),
            Err(Error::InvalidArguments { .. })
        ))
    }

    #[test]
    fn failed_command() {
        assert!(matches!(
            command("false", None::<&str>),
            Err(Error::CommandFailure { .. })
        ));
        assert!(matches!(
            command("/does/not/exist", None::<&str>),
            Err(Error::ExecutionFailure { .. })
        ));
    }
}
