use super::private::{Access, PortRole, Trunk};
use super::{read_unit_file, NETWORK_FILE_PREFIX};
use crate::interface_id::InterfaceName;
use crate::networkd::{error, Result};
use crate::port::Role;
use crate::vlan_id::{self, VlanId};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use systemd_derive::{SystemdUnit, SystemdUnitSection};

#[derive(Debug, Default, SystemdUnit)]
pub(crate) struct NetworkConfig {
    r#match: Option<MatchSection>,
    network: Option<NetworkSection>,
    bridge_vlan: Option<BridgeVlanSection>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Match")]
struct MatchSection {
    #[systemd(entry = "Name")]
    name: Option<InterfaceName>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Network")]
struct NetworkSection {
    #[systemd(entry = "Bridge")]
    bridge: Option<InterfaceName>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "BridgeVLAN")]
struct BridgeVlanSection {
    // Every VLAN carried by the port, ascending
    #[systemd(entry = "VLAN")]
    vlans: Vec<VlanId>,
    #[systemd(entry = "PVID")]
    pvid: Option<VlanId>,
    #[systemd(entry = "EgressUntagged")]
    egress_untagged: Vec<VlanId>,
}

impl NetworkConfig {
    const FILE_EXT: &'static str = "network";

    fn new_with_name(name: InterfaceName) -> Self {
        Self {
            r#match: Some(MatchSection { name: Some(name) }),
            ..Default::default()
        }
    }

    /// The name of the interface this config matches
    pub(crate) fn name(&self) -> Option<&InterfaceName> {
        self.r#match.as_ref().and_then(|m| m.name.as_ref())
    }

    /// The bridge this config enslaves the interface to
    pub(crate) fn bridge(&self) -> Option<&InterfaceName> {
        self.network.as_ref().and_then(|n| n.bridge.as_ref())
    }

    /// Reconstruct the port role from the `[BridgeVLAN]` settings.  A port whose only VLAN is its
    /// PVID is an access port; anything else is a trunk with the PVID as its native VLAN.  Returns
    /// `None` if the config carries no VLANs at all.
    pub(crate) fn role(&self) -> Option<Role> {
        let bridge_vlan = self.bridge_vlan.as_ref()?;
        let pvid = bridge_vlan.pvid;

        let mut carried: BTreeSet<VlanId> = bridge_vlan.vlans.iter().copied().collect();
        carried.extend(pvid);
        carried.extend(bridge_vlan.egress_untagged.iter().copied());

        // Only the PVID can be expressed as untagged in a declaration
        let stray_untagged: Vec<String> = bridge_vlan
            .egress_untagged
            .iter()
            .filter(|v| Some(**v) != pvid)
            .map(|v| v.to_string())
            .collect();
        if !stray_untagged.is_empty() {
            warn!(
                "VLANs {} of '{}' are untagged but not the PVID, treating them as tagged",
                stray_untagged.join(","),
                self.name().map(|n| n.to_string()).unwrap_or_default()
            );
        }

        match pvid {
            Some(vlan) if carried.len() == 1 => Some(Role::Access { vlan }),
            _ if carried.is_empty() => None,
            native => {
                carried.retain(|v| Some(*v) != native);
                Some(Role::Trunk {
                    tagged: carried,
                    native,
                })
            }
        }
    }

    /// Build the proper prefixed path for the config file
    pub(crate) fn config_path<P: AsRef<Path>>(&self, config_dir: P) -> Result<PathBuf> {
        let name = self.name().context(error::ConfigMissingNameSnafu {
            what: "network config",
        })?;
        Ok(Self::path_for(config_dir, name))
    }

    /// The path of the network config for `name`, whether or not it exists
    pub(crate) fn path_for<P: AsRef<Path>>(config_dir: P, name: &InterfaceName) -> PathBuf {
        let filename = format!("{}{}", NETWORK_FILE_PREFIX, name);
        let mut cfg_path = config_dir.as_ref().join(filename);
        cfg_path.set_extension(Self::FILE_EXT);
        cfg_path
    }

    /// Read the existing network config for `name`, if there is one.  Only the settings this tool
    /// manages are kept; anything else in the file is ignored.
    pub(crate) fn read_config_file<P: AsRef<Path>>(
        config_dir: P,
        name: &InterfaceName,
    ) -> Result<Option<Self>> {
        let path = Self::path_for(config_dir, name);
        let Some(unit) = read_unit_file(&path)? else {
            return Ok(None);
        };

        let interface_name = |value: &str| {
            InterfaceName::try_from(value)
                .context(error::ExistingInterfaceNameSnafu { path: &path })
        };
        let vlan_list = |value: &str| {
            vlan_id::parse_vlan_list(value).context(error::ExistingVlanIdSnafu { path: &path })
        };

        let matched = unit
            .last_value(MatchSection::SECTION, "Name")
            .map(interface_name)
            .transpose()?;
        ensure!(
            matched.as_ref() == Some(name),
            error::ExistingConfigInvalidSnafu {
                path: &path,
                reason: format!("expected [Match] Name={}", name),
            }
        );

        let bridge = unit
            .last_value(NetworkSection::SECTION, "Bridge")
            .map(interface_name)
            .transpose()?;

        let mut bridge_vlan = None;
        if unit.has_section(BridgeVlanSection::SECTION) {
            let mut vlans = BTreeSet::new();
            for value in unit.values(BridgeVlanSection::SECTION, "VLAN") {
                vlans.extend(vlan_list(value)?);
            }
            let mut egress_untagged = BTreeSet::new();
            for value in unit.values(BridgeVlanSection::SECTION, "EgressUntagged") {
                egress_untagged.extend(vlan_list(value)?);
            }
            let pvid = unit
                .last_value(BridgeVlanSection::SECTION, "PVID")
                .map(|value| {
                    VlanId::from_str(value).context(error::ExistingVlanIdSnafu { path: &path })
                })
                .transpose()?;

            bridge_vlan = Some(BridgeVlanSection {
                vlans: vlans.into_iter().collect(),
                pvid,
                egress_untagged: egress_untagged.into_iter().collect(),
            });
        }

        Ok(Some(Self {
            r#match: Some(MatchSection { name: matched }),
            network: bridge.map(|bridge| NetworkSection {
                bridge: Some(bridge),
            }),
            bridge_vlan,
        }))
    }

    // Convenience accessors for the builder, so it doesn't need `get_or_insert_with()` everywhere
    fn network_mut(&mut self) -> &mut NetworkSection {
        self.network.get_or_insert_with(NetworkSection::default)
    }

    fn bridge_vlan_mut(&mut self) -> &mut BridgeVlanSection {
        self.bridge_vlan.get_or_insert_with(BridgeVlanSection::default)
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=
//
/// The builder for `NetworkConfig`.
//
// Access and trunk ports share the `[Match]` and `[Network]` sections but fill `[BridgeVLAN]`
// differently.  The type parameter limits the available methods to the ones that make sense for
// the role being built, e.g. only a trunk can be given a native VLAN.
#[derive(Debug)]
pub(crate) struct NetworkBuilder<T: PortRole> {
    network: NetworkConfig,
    spooky: PhantomData<T>,
}

impl<T: PortRole> NetworkBuilder<T> {
    pub(crate) fn build(self) -> NetworkConfig {
        self.network
    }

    /// Enslave the port to a bridge
    pub(crate) fn with_bridge(&mut self, bridge: InterfaceName) {
        self.network.network_mut().bridge = Some(bridge)
    }
}

impl NetworkBuilder<Access> {
    /// Create a new .network config for an access port: `vlan` is carried, is the PVID and
    /// leaves the port untagged
    pub(crate) fn new_access(name: InterfaceName, vlan: VlanId) -> Self {
        let mut network = NetworkConfig::new_with_name(name);
        let bridge_vlan = network.bridge_vlan_mut();
        bridge_vlan.vlans = vec![vlan];
        bridge_vlan.pvid = Some(vlan);
        bridge_vlan.egress_untagged = vec![vlan];

        Self {
            network,
            spooky: PhantomData,
        }
    }
}

impl NetworkBuilder<Trunk> {
    /// Create a new .network config for a trunk port carrying `tagged` VLANs
    pub(crate) fn new_trunk(name: InterfaceName, tagged: &BTreeSet<VlanId>) -> Self {
        let mut network = NetworkConfig::new_with_name(name);
        network.bridge_vlan_mut().vlans = tagged.iter().copied().collect();

        Self {
            network,
            spooky: PhantomData,
        }
    }

    /// Untagged frames on the trunk belong to `vlan`
    pub(crate) fn with_native_vlan(&mut self, vlan: VlanId) {
        let bridge_vlan = self.network.bridge_vlan_mut();
        if let Err(index) = bridge_vlan.vlans.binary_search(&vlan) {
            bridge_vlan.vlans.insert(index, vlan);
        }
        bridge_vlan.pvid = Some(vlan);
        bridge_vlan.egress_untagged = vec![vlan];
    }
}
