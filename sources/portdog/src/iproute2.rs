//! The iproute2 module builds the `ip` and `bridge` commands that give a port its role right away,
//! for when waiting on a systemd-networkd reload isn't an option.  The commands are only printed;
//! running them is left to the operator.
use crate::port::Port;

const IP_BIN: &str = "ip";
const BRIDGE_BIN: &str = "bridge";

/// The commands to apply `port`'s bridge membership and VLANs, in the order they must run
pub(crate) fn port_commands(port: &Port) -> Vec<String> {
    let mut commands = Vec::new();

    if let Some(bridge) = &port.bridge {
        commands.push(format!("{} link set dev {} master {}", IP_BIN, port.name, bridge));
    }

    for vlan in port.role.tagged_vlans() {
        commands.push(format!("{} vlan add vid {} dev {}", BRIDGE_BIN, vlan, port.name));
    }

    if let Some(native) = port.role.native_vlan() {
        commands.push(format!(
            "{} vlan add vid {} dev {} pvid untagged",
            BRIDGE_BIN, native, port.name
        ));
    }

    commands
}
