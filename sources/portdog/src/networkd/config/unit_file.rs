//! A small reader for the "INI-like" format of systemd unit files, used to read back
//! configuration that is already on disk.  Sections and keys may repeat, so everything is kept in
//! file order.  Line continuations aren't supported; networkd files written by hand rarely use
//! them and we never write them.
use lazy_static::lazy_static;
use regex::Regex;
use snafu::ensure;
use std::str::FromStr;

// Matches a section header:
//     [BridgeVLAN] -> name=BridgeVLAN
// and a key/value entry, tolerating whitespace around the '=':
//     VLAN = 10-20 -> key=VLAN, val=10-20
lazy_static! {
    static ref SECTION: Regex = Regex::new(r"^\[(?P<name>[^\[\]]+)\]$").unwrap();
    static ref ENTRY: Regex = Regex::new(r"^(?P<key>[A-Za-z0-9]+)\s*=\s*(?P<val>.*)$").unwrap();
}

#[derive(Debug, Default)]
pub(crate) struct UnitFile {
    sections: Vec<Section>,
}

#[derive(Debug)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl UnitFile {
    /// All values for `key` in every section named `section`, in file order
    pub(crate) fn values<'a>(
        &'a self,
        section: &'a str,
        key: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.sections
            .iter()
            .filter(move |s| s.name == section)
            .flat_map(|s| s.entries.iter())
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The value systemd would use for a single-valued `key`: the last one assigned
    pub(crate) fn last_value<'a>(&'a self, section: &'a str, key: &'a str) -> Option<&'a str> {
        self.values(section, key).last()
    }

    pub(crate) fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|s| s.name == section)
    }
}

impl FromStr for UnitFile {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut unit = UnitFile::default();

        for (index, raw_line) in s.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(cap) = SECTION.captures(line) {
                unit.sections.push(Section {
                    name: cap["name"].trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let cap = ENTRY.captures(line);
            ensure!(
                cap.is_some(),
                error::InvalidLineSnafu {
                    line: index + 1,
                    content: raw_line
                }
            );
            let Some(cap) = cap else { continue };

            match unit.sections.last_mut() {
                Some(section) => section
                    .entries
                    .push((cap["key"].to_string(), cap["val"].trim().to_string())),
                // systemd ignores assignments outside of a section, and so do we
                None => debug!("Ignoring entry outside of a section on line {}", index + 1),
            }
        }

        Ok(unit)
    }
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub(crate) enum Error {
        #[snafu(display("Unable to parse line {}: '{}'", line, content))]
        InvalidLine { line: usize, content: String },
    }
}

pub(crate) use error::Error;
type Result<T> = std::result::Result<T, error::Error>;
