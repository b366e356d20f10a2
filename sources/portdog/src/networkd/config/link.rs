use super::{read_unit_file, LINK_FILE_PREFIX};
use crate::interface_id::{InterfaceName, MacAddress};
use crate::networkd::{error, Result};
use snafu::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use systemd_derive::{SystemdUnit, SystemdUnitSection};

#[derive(Debug, Default, SystemdUnit)]
pub(crate) struct LinkConfig {
    r#match: Option<MatchSection>,
    link: Option<LinkSection>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Match")]
struct MatchSection {
    #[systemd(entry = "OriginalName")]
    original_name: Option<InterfaceName>,
    #[systemd(entry = "MACAddress")]
    mac_address: Option<MacAddress>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Link")]
struct LinkSection {
    #[systemd(entry = "Alias")]
    alias: Option<String>,
}

impl LinkConfig {
    const FILE_EXT: &'static str = "link";

    /// Create a new .link config matching the kernel's name for the interface.  The `[Link]`
    /// section is always present, even if empty, so udev treats the file as complete.
    pub(crate) fn new_with_name(name: InterfaceName) -> Self {
        Self {
            r#match: Some(MatchSection {
                original_name: Some(name),
                mac_address: None,
            }),
            link: Some(LinkSection::default()),
        }
    }

    /// Only match the interface if it also has this MAC address
    pub(crate) fn with_mac_address(&mut self, mac: MacAddress) {
        self.match_mut().mac_address = Some(mac)
    }

    /// Set the interface alias (`ip link show` prints it as "alias")
    pub(crate) fn with_alias(&mut self, alias: String) {
        self.link_mut().alias = Some(alias)
    }

    pub(crate) fn mac_address(&self) -> Option<&MacAddress> {
        self.r#match.as_ref().and_then(|m| m.mac_address.as_ref())
    }

    pub(crate) fn alias(&self) -> Option<&str> {
        self.link.as_ref().and_then(|l| l.alias.as_deref())
    }

    /// Build the proper prefixed path for the config file
    pub(crate) fn config_path<P: AsRef<Path>>(&self, config_dir: P) -> Result<PathBuf> {
        let name = self
            .r#match
            .as_ref()
            .and_then(|m| m.original_name.as_ref())
            .context(error::ConfigMissingNameSnafu {
                what: "link config",
            })?;
        Ok(Self::path_for(config_dir, name))
    }

    /// The path of the link config for `name`, whether or not it exists
    pub(crate) fn path_for<P: AsRef<Path>>(config_dir: P, name: &InterfaceName) -> PathBuf {
        let filename = format!("{}{}", LINK_FILE_PREFIX, name);
        let mut cfg_path = config_dir.as_ref().join(filename);
        cfg_path.set_extension(Self::FILE_EXT);
        cfg_path
    }

    /// Read the existing link config for `name`, if there is one
    pub(crate) fn read_config_file<P: AsRef<Path>>(
        config_dir: P,
        name: &InterfaceName,
    ) -> Result<Option<Self>> {
        let path = Self::path_for(config_dir, name);
        let Some(unit) = read_unit_file(&path)? else {
            return Ok(None);
        };

        let mut link = Self::new_with_name(name.clone());
        if let Some(mac) = unit.last_value(MatchSection::SECTION, "MACAddress") {
            let mac = MacAddress::try_from(mac)
                .context(error::ExistingMacAddressSnafu { path: &path })?;
            link.with_mac_address(mac);
        }
        // An empty assignment resets the alias
        if let Some(alias) = unit
            .last_value(LinkSection::SECTION, "Alias")
            .filter(|a| !a.is_empty())
        {
            link.with_alias(alias.to_string());
        }

        Ok(Some(link))
    }

    fn match_mut(&mut self) -> &mut MatchSection {
        self.r#match.get_or_insert_with(MatchSection::default)
    }

    fn link_mut(&mut self) -> &mut LinkSection {
        self.link.get_or_insert_with(LinkSection::default)
    }
}
