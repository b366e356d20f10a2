use crate::{interface_id, vlan_id};
use snafu::Snafu;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum Error {
    #[snafu(display("Port '{}' is defined more than once", name))]
    DuplicatePort { name: String },

    #[snafu(display("Invalid interface name: {}", source))]
    InvalidInterfaceName { source: interface_id::Error },

    #[snafu(display("Invalid MAC address for port '{}': {}", port, source))]
    InvalidMacAddress {
        port: String,
        source: interface_id::Error,
    },

    #[snafu(display("Invalid port configuration: {}", reason))]
    InvalidPortConfig { reason: String },

    #[snafu(display(
        "Invalid port definition, expected 'name:access:vlan' or 'name:trunk:vlans[:native]', got '{}'",
        definition
    ))]
    InvalidPortDef { definition: String },

    #[snafu(display("Invalid port role, expected 'access' or 'trunk', got '{}'", given))]
    InvalidPortRole { given: String },

    #[snafu(display("Invalid VLAN for port '{}': {}", port, source))]
    InvalidVlanId {
        port: String,
        source: vlan_id::Error,
    },

    #[snafu(display("Failed to read port config from '{}': {}", path.display(), source))]
    PortConfigReadFailed { path: PathBuf, source: io::Error },

    #[snafu(display("Failed to parse port config: {}", source))]
    PortConfigParse { source: toml::de::Error },

    #[snafu(display("Failed to serialize port config: {}", source))]
    PortConfigSerialize { source: toml::ser::Error },
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
