//! The networkd module turns validated `Port`s into systemd-networkd config files, and reads
//! existing files back into `Port`s.
pub(crate) mod config;

use self::config::{LinkConfig, NetworkBuilder, NetworkConfig, NetworkDConfigFile};
use crate::interface_id::InterfaceName;
use crate::port::{Port, Role};
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) struct NetworkDConfig {
    ports: Vec<Port>,
}

impl NetworkDConfig {
    pub(crate) fn new(ports: Vec<Port>) -> Self {
        Self { ports }
    }

    /// Generate systemd-networkd configuration files for all ports, in declaration order
    pub(crate) fn create_files(&self) -> Vec<NetworkDConfigFile> {
        self.ports.iter().flat_map(create_files).collect()
    }

    /// Existing .link files of ports that no longer pin a MAC address or set an alias.  They're
    /// left over from an earlier declaration and would keep applying its settings.
    pub(crate) fn stale_files<P: AsRef<Path>>(&self, config_dir: P) -> Vec<PathBuf> {
        let config_dir = config_dir.as_ref();
        self.ports
            .iter()
            .filter(|port| port.create_link().is_none())
            .map(|port| LinkConfig::path_for(config_dir, &port.name))
            .filter(|path| path.exists())
            .collect()
    }
}

fn create_files(port: &Port) -> Vec<NetworkDConfigFile> {
    let mut configs = Vec::new();
    if let Some(link) = port.create_link() {
        configs.push(NetworkDConfigFile::Link(link));
    }
    configs.push(NetworkDConfigFile::Network(port.create_network()));
    configs
}

/// Ports implement this trait to create their .network file
trait NetworkFileCreator {
    fn create_network(&self) -> NetworkConfig;
}

/// Ports implement this trait to create a .link file, which is only needed to pin a MAC address
/// or set an alias
trait LinkFileCreator {
    fn create_link(&self) -> Option<LinkConfig>;
}

impl NetworkFileCreator for Port {
    fn create_network(&self) -> NetworkConfig {
        match &self.role {
            Role::Access { vlan } => {
                let mut network = NetworkBuilder::new_access(self.name.clone(), *vlan);
                if let Some(bridge) = self.bridge.clone() {
                    network.with_bridge(bridge)
                }
                network.build()
            }
            Role::Trunk { tagged, native } => {
                let mut network = NetworkBuilder::new_trunk(self.name.clone(), tagged);
                if let Some(bridge) = self.bridge.clone() {
                    network.with_bridge(bridge)
                }
                if let Some(native) = native {
                    network.with_native_vlan(*native)
                }
                network.build()
            }
        }
    }
}

impl LinkFileCreator for Port {
    fn create_link(&self) -> Option<LinkConfig> {
        if self.mac_address.is_none() && self.alias.is_none() {
            return None;
        }

        let mut link = LinkConfig::new_with_name(self.name.clone());
        if let Some(mac) = self.mac_address.clone() {
            link.with_mac_address(mac)
        }
        if let Some(alias) = self.alias.clone() {
            link.with_alias(alias)
        }
        Some(link)
    }
}

/// Ensure the directory watched by systemd-networkd exists.  It isn't created for the caller; a
/// missing directory usually means the wrong path or a host without networkd.
pub(crate) fn ensure_config_dir<P: AsRef<Path>>(config_dir: P) -> Result<()> {
    let config_dir = config_dir.as_ref();
    ensure!(
        config_dir.is_dir(),
        error::MissingTargetDirectorySnafu { path: config_dir }
    );
    Ok(())
}

/// Reconstruct the port declared by the existing config files for `name`.  Returns `None` if
/// there is no .network file for the interface.
pub(crate) fn read_port<P: AsRef<Path>>(
    config_dir: P,
    name: &InterfaceName,
) -> Result<Option<Port>> {
    let config_dir = config_dir.as_ref();
    let Some(network) = NetworkConfig::read_config_file(config_dir, name)? else {
        return Ok(None);
    };
    let role = network.role().context(error::ExistingConfigInvalidSnafu {
        path: NetworkConfig::path_for(config_dir, name),
        reason: "no VLANs configured in [BridgeVLAN]",
    })?;
    let link = LinkConfig::read_config_file(config_dir, name)?;

    Ok(Some(Port {
        name: name.clone(),
        role,
        bridge: network.bridge().cloned(),
        mac_address: link.as_ref().and_then(|l| l.mac_address().cloned()),
        alias: link.as_ref().and_then(|l| l.alias().map(str::to_string)),
    }))
}

/// Remove the config files for `name`, returning the paths that were actually removed
pub(crate) fn remove_port_files<P: AsRef<Path>>(
    config_dir: P,
    name: &InterfaceName,
) -> Result<Vec<PathBuf>> {
    let config_dir = config_dir.as_ref();
    let mut removed = Vec::new();

    for path in [
        LinkConfig::path_for(config_dir, name),
        NetworkConfig::path_for(config_dir, name),
    ] {
        if remove_config_file(&path)? {
            removed.push(path);
        }
    }

    Ok(removed)
}

/// Remove a single config file.  Returns whether there was a file to remove.
pub(crate) fn remove_config_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No config to remove at '{}'", path.display());
            Ok(false)
        }
        Err(e) => Err(e).context(error::ConfigFileRemoveSnafu { path }),
    }
}

mod error {
    use super::config::UnitFileError;
    use crate::{interface_id, vlan_id};
    use snafu::Snafu;
    use std::io;
    use std::path::PathBuf;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Unable to create '{}', missing name", what))]
        ConfigMissingName { what: String },

        #[snafu(display("Unable to read '{}': {}", path.display(), source))]
        ConfigFileRead { path: PathBuf, source: io::Error },

        #[snafu(display("Unable to remove '{}': {}", path.display(), source))]
        ConfigFileRemove { path: PathBuf, source: io::Error },

        #[snafu(display("Unable to write '{}': {}", path.display(), source))]
        ConfigFileWrite { path: PathBuf, source: io::Error },

        #[snafu(display("Invalid config in '{}': {}", path.display(), reason))]
        ExistingConfigInvalid { path: PathBuf, reason: String },

        #[snafu(display("Unable to parse '{}': {}", path.display(), source))]
        ExistingConfigParse {
            path: PathBuf,
            source: UnitFileError,
        },

        #[snafu(display("Invalid interface name in '{}': {}", path.display(), source))]
        ExistingInterfaceName {
            path: PathBuf,
            source: interface_id::Error,
        },

        #[snafu(display("Invalid MAC address in '{}': {}", path.display(), source))]
        ExistingMacAddress {
            path: PathBuf,
            source: interface_id::Error,
        },

        #[snafu(display("Invalid VLAN in '{}': {}", path.display(), source))]
        ExistingVlanId {
            path: PathBuf,
            source: vlan_id::Error,
        },

        #[snafu(display(
            "Target directory '{}' does not exist or is not a directory",
            path.display()
        ))]
        MissingTargetDirectory { path: PathBuf },
    }
}
pub(crate) use error::Error;
pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networkd::config::WriteOutcome;
    use crate::port_config;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn ports_toml() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("port_config")
            .join("ports.toml")
    }

    fn name(name: &str) -> InterfaceName {
        InterfaceName::try_from(name).unwrap()
    }

    fn write_all(dir: &Path, ports: Vec<Port>) -> Vec<(PathBuf, WriteOutcome)> {
        ensure_config_dir(dir).unwrap();
        NetworkDConfig::new(ports)
            .create_files()
            .iter()
            .map(|f| {
                (
                    f.config_path(dir).unwrap(),
                    f.write_config_file(dir).unwrap(),
                )
            })
            .collect()
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn files_per_port() {
        let ports = port_config::from_path(ports_toml()).unwrap();
        let files: Vec<String> = NetworkDConfig::new(ports)
            .create_files()
            .iter()
            .map(|f| {
                f.config_path("")
                    .unwrap()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        assert_eq!(
            files,
            vec![
                "20-swp1.network",
                "20-swp2.network",
                "00-swp10.link",
                "20-swp10.network",
                "20-swp3.network",
            ]
        )
    }

    #[test]
    fn apply_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ports = port_config::from_path(ports_toml()).unwrap();

        let first = write_all(dir.path(), ports.clone());
        assert!(first.iter().all(|(_, o)| *o == WriteOutcome::Created));
        let contents: Vec<String> = first
            .iter()
            .map(|(p, _)| fs::read_to_string(p).unwrap())
            .collect();

        let second = write_all(dir.path(), ports);
        assert!(second.iter().all(|(_, o)| *o == WriteOutcome::Unchanged));
        for ((path, _), content) in second.iter().zip(contents) {
            assert_eq!(fs::read_to_string(path).unwrap(), content)
        }
    }

    #[test]
    fn access_and_trunk_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ports =
            port_config::from_definitions(&["swp1:access:10", "swp2:trunk:10,20,30"], None)
                .unwrap();
        write_all(dir.path(), ports);

        let swp1 = fs::read_to_string(dir.path().join("20-swp1.network")).unwrap();
        assert!(swp1.contains("Name=swp1\n"));
        assert!(swp1.contains("PVID=10\n"));
        assert!(swp1.contains("EgressUntagged=10\n"));

        let swp2 = fs::read_to_string(dir.path().join("20-swp2.network")).unwrap();
        for vlan in ["VLAN=10\n", "VLAN=20\n", "VLAN=30\n"] {
            assert!(swp2.contains(vlan), "{vlan}");
        }
        assert!(!swp2.contains("EgressUntagged"));

        // No MAC or alias, no .link files
        assert!(!dir.path().join("00-swp1.link").exists());
        assert!(!dir.path().join("00-swp2.link").exists());
    }

    #[test]
    fn changing_one_port_leaves_others() {
        let dir = tempfile::tempdir().unwrap();
        let swp2_path = dir.path().join("20-swp2.network");

        let before =
            port_config::from_definitions(&["swp1:access:10", "swp2:trunk:10,20,30"], None)
                .unwrap();
        write_all(dir.path(), before);
        let swp2_mtime = mtime(&swp2_path);

        // Some filesystems have coarse timestamps; make sure a rewrite would be visible
        std::thread::sleep(std::time::Duration::from_millis(50));

        let after =
            port_config::from_definitions(&["swp1:access:20", "swp2:trunk:10,20,30"], None)
                .unwrap();
        let outcomes = write_all(dir.path(), after);

        assert_eq!(
            outcomes,
            vec![
                (dir.path().join("20-swp1.network"), WriteOutcome::Updated),
                (swp2_path.clone(), WriteOutcome::Unchanged),
            ]
        );
        assert_eq!(mtime(&swp2_path), swp2_mtime);
        let swp1 = fs::read_to_string(dir.path().join("20-swp1.network")).unwrap();
        assert!(swp1.contains("PVID=20\n"));
    }

    #[test]
    fn missing_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("network");
        assert!(matches!(
            ensure_config_dir(&missing),
            Err(Error::MissingTargetDirectory { .. })
        ));
        // A file isn't a directory either
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(ensure_config_dir(file).is_err());
    }

    #[test]
    fn written_ports_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let ports = port_config::from_path(ports_toml()).unwrap();
        write_all(dir.path(), ports.clone());

        for port in ports {
            let read = read_port(dir.path(), &port.name).unwrap().unwrap();
            assert_eq!(read, port);
        }
    }

    #[test]
    fn dropped_alias_marks_link_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut port = port_config::from_definitions(&["swp1:access:10"], None)
            .unwrap()
            .remove(0);
        port.alias = Some("old uplink".to_string());
        write_all(dir.path(), vec![port.clone()]);
        let link_path = dir.path().join("00-swp1.link");
        assert!(link_path.exists());

        port.alias = None;
        let config = NetworkDConfig::new(vec![port.clone()]);
        let stale = config.stale_files(dir.path());
        assert_eq!(stale, vec![link_path.clone()]);
        assert!(remove_config_file(&stale[0]).unwrap());

        assert!(!link_path.exists());
        assert!(config.stale_files(dir.path()).is_empty());
        let read = read_port(dir.path(), &name("swp1")).unwrap().unwrap();
        assert_eq!(read, port);
    }

    #[test]
    fn read_unknown_port() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_port(dir.path(), &name("swp1")).unwrap().is_none());
    }

    #[test]
    fn remove_files() {
        let dir = tempfile::tempdir().unwrap();
        let ports = port_config::from_path(ports_toml()).unwrap();
        write_all(dir.path(), ports);

        let removed = remove_port_files(dir.path(), &name("swp10")).unwrap();
        assert_eq!(
            removed,
            vec![
                dir.path().join("00-swp10.link"),
                dir.path().join("20-swp10.network"),
            ]
        );
        // Other ports are untouched
        assert!(dir.path().join("20-swp1.network").exists());
        // Removing again is fine, there's just nothing to do
        assert!(remove_port_files(dir.path(), &name("swp10"))
            .unwrap()
            .is_empty());
    }
}
