//! The port_config module contains the structures needed to deserialize a port declaration file.
//! It also contains the `FromStr` implementations to create a declaration from a `--port`
//! definition given on the command line.
//!
//! These structures are the user-facing options for declaring switch port roles.  Everything is
//! validated and converted into `Port`s up front, so a bad declaration never leaves some ports
//! written and others not.
mod error;
mod v1;

use crate::interface_id::InterfaceName;
use crate::port::Port;
pub(crate) use error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::fs;
use std::path::Path;
use std::str::FromStr;
pub(crate) use v1::{PortConfigV1, PortV1};

/// This trait must be implemented by each new version of port config
pub(crate) trait Ports {
    /// Does the config contain any ports?
    fn has_ports(&self) -> bool;

    /// Converts the config into validated `Port`s, in declaration order
    fn ports(&self) -> Result<Vec<Port>>;
}

/// This private trait must also be implemented by each new version of port config.  It is used
/// during the deserialization of the config to check that each port's options make sense for its
/// role before any values are converted.
trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Read a port declaration file and return the ports it declares
pub(crate) fn from_path<P>(path: P) -> Result<Vec<Port>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let config_str =
        fs::read_to_string(path).context(error::PortConfigReadFailedSnafu { path })?;
    let port_config = deserialize_config(&config_str)?;

    ensure!(
        port_config.has_ports(),
        error::InvalidPortConfigSnafu {
            reason: format!("no ports declared in '{}'", path.display()),
        }
    );

    port_config.ports()
}

/// Build ports from `--port` definitions given on the command line.  `bridge`, if given, applies
/// to every port.
pub(crate) fn from_definitions<S>(definitions: &[S], bridge: Option<&str>) -> Result<Vec<Port>>
where
    S: AsRef<str>,
{
    let mut port_config = PortConfigV1 {
        bridge: bridge.map(str::to_string),
        ports: Default::default(),
    };

    for definition in definitions {
        let single = PortConfigV1::from_str(definition.as_ref())?;
        for (name, port) in single.ports {
            ensure!(
                !port_config.ports.contains_key(&name),
                error::DuplicatePortSnafu { name }
            );
            port_config.ports.insert(name, port);
        }
    }

    ensure!(
        port_config.has_ports(),
        error::InvalidPortConfigSnafu {
            reason: "no ports given",
        }
    );

    port_config.validate()?;
    port_config.ports()
}

/// Render ports as the latest version of the declaration file, e.g. to show what's configured
/// already in a form that can be fed back to `from_path()`
pub(crate) fn to_toml(ports: &[Port]) -> Result<String> {
    #[derive(Debug, Serialize)]
    struct ConfigToml {
        version: u8,
        ports: IndexMap<String, PortV1>,
    }

    let config = ConfigToml {
        version: 1,
        ports: ports
            .iter()
            .map(|port| (port.name.to_string(), PortV1::from(port)))
            .collect(),
    };
    toml::to_string(&config).context(error::PortConfigSerializeSnafu)
}

/// Deserialize the port config, using the version key to determine which config struct to
/// deserialize into
fn deserialize_config(config_str: &str) -> Result<Box<dyn Ports>> {
    #[derive(Debug, Deserialize)]
    struct ConfigToml {
        version: u8,
        #[serde(flatten)]
        port_config: toml::Value,
    }

    let ConfigToml {
        version,
        port_config,
    } = toml::from_str(config_str).context(error::PortConfigParseSnafu)?;

    let port_config: Box<dyn Ports> = match version {
        1 => validate_config::<PortConfigV1>(port_config)?,
        _ => {
            return error::InvalidPortConfigSnafu {
                reason: format!("Unknown port config version: {}", version),
            }
            .fail()
        }
    };

    Ok(port_config)
}

fn validate_config<'a, P>(config_value: toml::Value) -> Result<Box<P>>
where
    P: Ports + Validate + Deserialize<'a>,
{
    let config = config_value
        .try_into::<P>()
        .context(error::PortConfigParseSnafu)?;
    config.validate()?;

    Ok(Box::new(config))
}

/// Parse an interface name, attaching the error context shared by every config version
fn interface_name(name: &str) -> Result<InterfaceName> {
    InterfaceName::try_from(name).context(error::InvalidInterfaceNameSnafu)
}
