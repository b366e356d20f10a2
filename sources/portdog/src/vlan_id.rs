//! The vlan_id module contains the definition of a valid VLAN ID, and the code to support
//! creating one from integers and strings.  A valid VLAN ID must fall between the range of
//! 1-4094; 0 means "priority tag only" and 4095 is reserved, so neither can be assigned to a port.
use snafu::{ensure, OptionExt};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

const MIN_VLAN_ID: i64 = 1;
const MAX_VLAN_ID: i64 = 4094;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VlanId {
    inner: u16,
}

impl TryFrom<i64> for VlanId {
    type Error = error::Error;

    fn try_from(id: i64) -> Result<Self> {
        ensure!(
            (MIN_VLAN_ID..=MAX_VLAN_ID).contains(&id),
            error::InvalidVlanIdSnafu {
                input: id.to_string()
            }
        );

        // The range check above guarantees this fits
        Ok(VlanId { inner: id as u16 })
    }
}

impl FromStr for VlanId {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s
            .trim()
            .parse::<i64>()
            .ok()
            .context(error::InvalidVlanIdSnafu { input: s })?;
        Self::try_from(id)
    }
}

impl Deref for VlanId {
    type Target = u16;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for VlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Parse a comma separated list of VLAN IDs and inclusive ranges, e.g. `10,20,30-32`, the same
/// syntax systemd-networkd accepts for `VLAN=`.  Duplicates collapse; the result is ordered.
pub(crate) fn parse_vlan_list(s: &str) -> Result<BTreeSet<VlanId>> {
    let mut vlans = BTreeSet::new();
    for item in s.split(',') {
        match item.split_once('-') {
            Some((low, high)) => {
                let low = VlanId::from_str(low)?;
                let high = VlanId::from_str(high)?;
                ensure!(
                    low <= high,
                    error::InvalidVlanRangeSnafu {
                        input: item.trim()
                    }
                );
                for id in *low..=*high {
                    vlans.insert(VlanId { inner: id });
                }
            }
            None => {
                vlans.insert(VlanId::from_str(item)?);
            }
        }
    }
    Ok(vlans)
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Invalid VLAN ID '{}': must be between 1-4094", input))]
        InvalidVlanId { input: String },

        #[snafu(display("Invalid VLAN range '{}': start is greater than end", input))]
        InvalidVlanRange { input: String },
    }
}

pub(crate) use error::Error;
type Result<T> = std::result::Result<T, error::Error>;
