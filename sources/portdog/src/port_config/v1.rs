//! The `v1` module contains the first version of the port configuration and implements the
//! appropriate traits.
//!
//! Values are deserialized loosely (plain strings and integers) and converted to their validated
//! types in `ports()`, so that a bad VLAN ID or interface name is reported as exactly that rather
//! than as a generic TOML error.
use super::{error, interface_name, Error, Ports, Result, Validate};
use crate::interface_id::{InterfaceName, MacAddress, LINE_TERMINATORS};
use crate::port::{Port, Role};
use crate::vlan_id::{self, VlanId};
use indexmap::{indexmap, IndexMap};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PortConfigV1 {
    // Default bridge for ports that don't name their own
    pub(crate) bridge: Option<String>,
    // Use an IndexMap to preserve the order of the ports defined in the file.  The TOML library
    // supports this through its `preserve_order` feature.  Files are still written per port, but
    // keeping the order keeps our output (and any error) in the order the user wrote things.
    #[serde(default)]
    pub(crate) ports: IndexMap<String, PortV1>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct PortV1 {
    pub(crate) role: RoleV1,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) vlan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tagged_vlans: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) native_vlan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) bridge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum RoleV1 {
    Access,
    Trunk,
}

// Implement `from_str()` so `--port` definitions reuse the serde names for roles
derive_fromstr_from_deserialize!(RoleV1);

impl Ports for PortConfigV1 {
    fn has_ports(&self) -> bool {
        !self.ports.is_empty()
    }

    fn ports(&self) -> Result<Vec<Port>> {
        let default_bridge = self.bridge.as_deref().map(interface_name).transpose()?;

        self.ports
            .iter()
            .map(|(name, config)| config.to_port(name, default_bridge.as_ref()))
            .collect()
    }
}

impl Validate for PortConfigV1 {
    fn validate(&self) -> Result<()> {
        for (name, port) in &self.ports {
            match port.role {
                RoleV1::Access => {
                    ensure!(
                        port.vlan.is_some(),
                        error::InvalidPortConfigSnafu {
                            reason: format!("access port '{}' must set 'vlan'", name),
                        }
                    );
                    ensure!(
                        port.tagged_vlans.is_none() && port.native_vlan.is_none(),
                        error::InvalidPortConfigSnafu {
                            reason: format!(
                                "access port '{}' can't set 'tagged-vlans' or 'native-vlan'",
                                name
                            ),
                        }
                    );
                }
                RoleV1::Trunk => {
                    ensure!(
                        port.tagged_vlans.as_ref().is_some_and(|v| !v.is_empty()),
                        error::InvalidPortConfigSnafu {
                            reason: format!(
                                "trunk port '{}' must set at least one of 'tagged-vlans'",
                                name
                            ),
                        }
                    );
                    ensure!(
                        port.vlan.is_none(),
                        error::InvalidPortConfigSnafu {
                            reason: format!(
                                "trunk port '{}' can't set 'vlan', use 'native-vlan' for untagged traffic",
                                name
                            ),
                        }
                    );
                    // The native VLAN leaves the port untagged, so a trunk carrying nothing else
                    // is an access port in disguise
                    ensure!(
                        port.tagged_vlans
                            .iter()
                            .flatten()
                            .any(|v| Some(*v) != port.native_vlan),
                        error::InvalidPortConfigSnafu {
                            reason: format!(
                                "trunk port '{}' must tag at least one VLAN besides its 'native-vlan'",
                                name
                            ),
                        }
                    );
                }
            }

            if let Some(alias) = &port.alias {
                // networkd reads an empty `Alias=` as "unset"
                ensure!(
                    !alias.is_empty(),
                    error::InvalidPortConfigSnafu {
                        reason: format!("alias for port '{}' is empty", name),
                    }
                );
                // An alias is written verbatim into the .link file; a line break would let it add
                // arbitrary entries
                ensure!(
                    !alias.contains(&LINE_TERMINATORS[..]),
                    error::InvalidPortConfigSnafu {
                        reason: format!("alias for port '{}' contains line terminators", name),
                    }
                );
            }
        }

        Ok(())
    }
}

impl PortV1 {
    fn to_port(&self, name: &str, default_bridge: Option<&InterfaceName>) -> Result<Port> {
        let port_name = interface_name(name)?;
        let vlan_id = |id: i64| -> Result<VlanId> {
            VlanId::try_from(id).context(error::InvalidVlanIdSnafu { port: name })
        };

        let role = match self.role {
            RoleV1::Access => {
                let vlan = self.vlan.context(error::InvalidPortConfigSnafu {
                    reason: format!("access port '{}' must set 'vlan'", name),
                })?;
                Role::Access {
                    vlan: vlan_id(vlan)?,
                }
            }
            RoleV1::Trunk => {
                let tagged = self
                    .tagged_vlans
                    .iter()
                    .flatten()
                    .map(|id| vlan_id(*id))
                    .collect::<Result<BTreeSet<VlanId>>>()?;
                let native = self.native_vlan.map(vlan_id).transpose()?;
                Role::Trunk { tagged, native }
            }
        };

        let bridge = match &self.bridge {
            Some(bridge) => Some(interface_name(bridge)?),
            None => default_bridge.cloned(),
        };

        let mac_address = self
            .mac_address
            .as_deref()
            .map(MacAddress::try_from)
            .transpose()
            .context(error::InvalidMacAddressSnafu { port: name })?;

        Ok(Port {
            name: port_name,
            role,
            bridge,
            mac_address,
            alias: self.alias.clone(),
        })
    }
}

impl From<&Port> for PortV1 {
    fn from(port: &Port) -> Self {
        let (role, vlan, tagged_vlans, native_vlan) = match &port.role {
            Role::Access { vlan } => (RoleV1::Access, Some(i64::from(**vlan)), None, None),
            Role::Trunk { tagged, native } => (
                RoleV1::Trunk,
                None,
                Some(tagged.iter().map(|v| i64::from(**v)).collect()),
                native.map(|v| i64::from(*v)),
            ),
        };

        PortV1 {
            role,
            vlan,
            tagged_vlans,
            native_vlan,
            bridge: port.bridge.as_ref().map(|b| b.to_string()),
            mac_address: port.mac_address.as_ref().map(|m| m.to_string()),
            alias: port.alias.clone(),
        }
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Allow a single port to be declared from a string, as given to `--port`.  The expected input
/// looks like `name:role:vlans[:native]`:
///
/// * `swp1:access:10` declares `swp1` an access port in VLAN 10.
/// * `swp2:trunk:10,20,30-32` declares `swp2` a trunk tagging VLANs 10, 20, 30, 31 and 32.
/// * `swp3:trunk:10,20:1` additionally makes VLAN 1 the native (untagged) VLAN of `swp3`.
///
/// A native VLAN only makes sense for trunks; an access port's VLAN is already untagged.
impl FromStr for PortConfigV1 {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut fields = s.split(':');
        let (name, role, vlans) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(role), Some(vlans))
                if !name.is_empty() && !role.is_empty() && !vlans.is_empty() =>
            {
                (name, role, vlans)
            }
            _ => return error::InvalidPortDefSnafu { definition: s }.fail(),
        };
        let native = fields.next();
        ensure!(
            fields.next().is_none(),
            error::InvalidPortDefSnafu { definition: s }
        );

        let name = interface_name(name)?;
        let role = RoleV1::from_str(role)
            .ok()
            .context(error::InvalidPortRoleSnafu { given: role })?;
        let vlans = vlan_id::parse_vlan_list(vlans)
            .context(error::InvalidVlanIdSnafu { port: name.to_string() })?
            .into_iter()
            .map(|v| i64::from(*v))
            .collect::<Vec<i64>>();

        let port = match role {
            RoleV1::Access => {
                ensure!(
                    vlans.len() == 1 && native.is_none(),
                    error::InvalidPortDefSnafu { definition: s }
                );
                PortV1 {
                    role,
                    vlan: vlans.first().copied(),
                    tagged_vlans: None,
                    native_vlan: None,
                    bridge: None,
                    mac_address: None,
                    alias: None,
                }
            }
            RoleV1::Trunk => {
                let native_vlan = native
                    .map(|n| {
                        VlanId::from_str(n)
                            .context(error::InvalidVlanIdSnafu { port: name.to_string() })
                    })
                    .transpose()?
                    .map(|v| i64::from(*v));
                PortV1 {
                    role,
                    vlan: None,
                    tagged_vlans: Some(vlans),
                    native_vlan,
                    bridge: None,
                    mac_address: None,
                    alias: None,
                }
            }
        };

        Ok(PortConfigV1 {
            bridge: None,
            ports: indexmap! {name.to_string() => port},
        })
    }
}
