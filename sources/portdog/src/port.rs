//! The port module contains the validated, version-independent description of a switch port.
//! Every supported input (net config file versions, `--port` definitions, existing networkd files)
//! is converted to a `Port` before anything is rendered.
use crate::interface_id::{InterfaceName, MacAddress};
use crate::vlan_id::VlanId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Port {
    pub(crate) name: InterfaceName,
    pub(crate) role: Role,
    // The bridge this port is enslaved to
    pub(crate) bridge: Option<InterfaceName>,
    pub(crate) mac_address: Option<MacAddress>,
    pub(crate) alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Role {
    /// A single untagged VLAN
    Access { vlan: VlanId },
    /// One or more tagged VLANs, optionally with a native VLAN for untagged traffic
    Trunk {
        tagged: BTreeSet<VlanId>,
        native: Option<VlanId>,
    },
}

impl Role {
    /// The VLAN untagged frames belong to, if any
    pub(crate) fn native_vlan(&self) -> Option<VlanId> {
        match self {
            Role::Access { vlan } => Some(*vlan),
            Role::Trunk { native, .. } => *native,
        }
    }

    /// Every VLAN carried by the port, tagged or not, in ascending order
    pub(crate) fn vlans(&self) -> BTreeSet<VlanId> {
        match self {
            Role::Access { vlan } => BTreeSet::from([*vlan]),
            Role::Trunk { tagged, native } => {
                let mut vlans = tagged.clone();
                vlans.extend(native.iter().copied());
                vlans
            }
        }
    }

    /// VLANs that leave the port tagged
    pub(crate) fn tagged_vlans(&self) -> BTreeSet<VlanId> {
        let native = self.native_vlan();
        self.vlans()
            .into_iter()
            .filter(|v| Some(*v) != native)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlan(id: i64) -> VlanId {
        VlanId::try_from(id).unwrap()
    }

    fn ids(set: BTreeSet<VlanId>) -> Vec<u16> {
        set.into_iter().map(|v| *v).collect()
    }

    #[test]
    fn access_role() {
        let role = Role::Access { vlan: vlan(10) };
        assert_eq!(role.native_vlan(), Some(vlan(10)));
        assert_eq!(ids(role.vlans()), vec![10]);
        assert!(role.tagged_vlans().is_empty());
    }

    #[test]
    fn trunk_role() {
        let role = Role::Trunk {
            tagged: BTreeSet::from([vlan(30), vlan(10), vlan(20)]),
            native: None,
        };
        assert_eq!(role.native_vlan(), None);
        assert_eq!(ids(role.vlans()), vec![10, 20, 30]);
        assert_eq!(ids(role.tagged_vlans()), vec![10, 20, 30]);
    }

    #[test]
    fn trunk_role_with_native() {
        let role = Role::Trunk {
            tagged: BTreeSet::from([vlan(10), vlan(20)]),
            native: Some(vlan(1)),
        };
        assert_eq!(ids(role.vlans()), vec![1, 10, 20]);
        assert_eq!(ids(role.tagged_vlans()), vec![10, 20]);
    }

    // Declaring the native VLAN in the tagged list as well doesn't make it tagged
    #[test]
    fn trunk_native_also_listed() {
        let role = Role::Trunk {
            tagged: BTreeSet::from([vlan(10), vlan(20)]),
            native: Some(vlan(10)),
        };
        assert_eq!(ids(role.vlans()), vec![10, 20]);
        assert_eq!(ids(role.tagged_vlans()), vec![20]);
    }
}
