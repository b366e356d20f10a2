//! The config module contains the structures and methods needed to create properly formatted
//! systemd-networkd configuration files, and to read back the ones already on disk.
mod link;
mod network;
mod unit_file;

pub(crate) use link::LinkConfig;
pub(crate) use network::{NetworkBuilder, NetworkConfig};
pub(crate) use unit_file::Error as UnitFileError;

use crate::networkd::{error, Result};
use snafu::ResultExt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use unit_file::UnitFile;

// .link files are read by udev and only the first matching file is used, so ours sort ahead of the
// distribution's defaults.  .network files for bridge ports come after any bridge definitions.
const LINK_FILE_PREFIX: &str = "00-";
const NETWORK_FILE_PREFIX: &str = "20-";

pub(crate) enum NetworkDConfigFile {
    Network(NetworkConfig),
    Link(LinkConfig),
}

/// What writing (or removing) a config file did, or would do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
    Removed,
}

impl WriteOutcome {
    pub(crate) fn is_change(&self) -> bool {
        *self != WriteOutcome::Unchanged
    }
}

impl Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOutcome::Created => write!(f, "created"),
            WriteOutcome::Updated => write!(f, "updated"),
            WriteOutcome::Unchanged => write!(f, "unchanged"),
            WriteOutcome::Removed => write!(f, "removed"),
        }
    }
}

impl NetworkDConfigFile {
    pub(crate) fn config_path<P: AsRef<Path>>(&self, config_dir: P) -> Result<PathBuf> {
        match self {
            NetworkDConfigFile::Network(network) => network.config_path(config_dir),
            NetworkDConfigFile::Link(link) => link.config_path(config_dir),
        }
    }

    /// The file content, exactly as it's written to disk
    pub(crate) fn render(&self) -> String {
        match self {
            NetworkDConfigFile::Network(network) => network.to_string(),
            NetworkDConfigFile::Link(link) => link.to_string(),
        }
    }

    /// Compare the rendered config with the file on disk, without writing anything
    pub(crate) fn pending_outcome<P: AsRef<Path>>(&self, config_dir: P) -> Result<WriteOutcome> {
        let cfg_path = self.config_path(config_dir)?;
        outcome(&cfg_path, &self.render())
    }

    /// Write the config to the proper directory with the proper prefix and file extension.  The
    /// file is only written if its content would change, so an unchanged file keeps its mtime.
    pub(crate) fn write_config_file<P: AsRef<Path>>(&self, config_dir: P) -> Result<WriteOutcome> {
        let cfg_path = self.config_path(config_dir)?;
        let content = self.render();

        let outcome = outcome(&cfg_path, &content)?;
        if outcome.is_change() {
            fs::write(&cfg_path, content)
                .context(error::ConfigFileWriteSnafu { path: &cfg_path })?;
        }
        Ok(outcome)
    }
}

// Compare bytes, a file that isn't valid UTF-8 is just replaced
fn outcome(path: &Path, content: &str) -> Result<WriteOutcome> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => Ok(WriteOutcome::Unchanged),
        Ok(_) => Ok(WriteOutcome::Updated),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(WriteOutcome::Created),
        Err(e) => Err(e).context(error::ConfigFileReadSnafu { path }),
    }
}

/// Read and parse a unit file, or `None` if it doesn't exist
fn read_unit_file(path: &Path) -> Result<Option<UnitFile>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(error::ConfigFileReadSnafu { path }),
    };

    UnitFile::from_str(&content)
        .map(Some)
        .context(error::ExistingConfigParseSnafu { path })
}

mod private {
    // The port roles a `NetworkBuilder` can build for.  They cannot be constructed and exist only
    // as phantom types.
    pub enum Access {}
    pub enum Trunk {}

    pub trait PortRole {}
    impl PortRole for Access {}
    impl PortRole for Trunk {}
}
