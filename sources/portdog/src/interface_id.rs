//! The interface_id module contains the definition of a valid network interface name and MAC
//! address and the code to support creation of either structure from string.
//!
//! A valid network interface name is defined by the criteria in the linux kernel:
//! https://elixir.bootlin.com/linux/v5.10.102/source/net/core/dev.c#L1138
//!
//! Interface names end up both inside generated files and in their filenames, so anything that
//! could break out of a `Name=` line or a path component is rejected here.
use snafu::{ensure, ResultExt};
use std::convert::TryFrom;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

/// Characters that rust doesn't treat as starting a new line via `lines()`, but which we don't
/// want inside a unit file value.
// https://en.wikipedia.org/wiki/Newline#Unicode
pub(crate) const LINE_TERMINATORS: [char; 7] = [
    '\n',       // newline (0A)
    '\r',       // carriage return (0D)
    '\u{000B}', // vertical tab
    '\u{000C}', // form feed
    '\u{0085}', // next line
    '\u{2028}', // line separator
    '\u{2029}', // paragraph separator
];

// Pattern characters understood by systemd's `[Match]` name matching
const GLOB_CHARS: [char; 4] = ['*', '?', '[', ']'];

/// InterfaceName can only be created from a string that contains a valid network interface name.
/// Validation is handled in the `TryFrom` implementation below.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct InterfaceName {
    inner: String,
}

impl TryFrom<String> for InterfaceName {
    type Error = error::Error;

    fn try_from(input: String) -> Result<Self> {
        ensure!(
            !input.contains(&LINE_TERMINATORS[..]),
            error::InvalidInterfaceNameSnafu {
                input,
                msg: "contains line terminators"
            }
        );

        // The length for an interface name is defined here:
        // https://elixir.bootlin.com/linux/v5.10.102/source/include/uapi/linux/if.h#L33
        // IFNAMSIZ is 16 including the trailing NUL, so a name must be 1-15 bytes.
        ensure!(
            !input.is_empty() && input.len() <= 15,
            error::InvalidInterfaceNameSnafu {
                input,
                msg: "invalid length, must be 1 to 15 characters long"
            }
        );

        ensure!(
            !input.contains('.')
                && !input.contains('/')
                && !input.contains(':')
                && !input.contains(char::is_whitespace),
            error::InvalidInterfaceNameSnafu {
                input,
                msg: "contains invalid characters"
            }
        );

        // The kernel allows these, but networkd treats a `Name=` containing them as a glob and the
        // resulting config would match other interfaces too
        ensure!(
            !input.contains(&GLOB_CHARS[..]),
            error::InvalidInterfaceNameSnafu {
                input,
                msg: "contains glob characters"
            }
        );

        Ok(Self { inner: input })
    }
}

impl TryFrom<&str> for InterfaceName {
    type Error = error::Error;

    fn try_from(input: &str) -> Result<Self> {
        Self::try_from(input.to_string())
    }
}

// Lets argh parse interface names straight from positional arguments
impl FromStr for InterfaceName {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

impl Deref for InterfaceName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Display for InterfaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct MacAddress {
    inner: String,
}

impl TryFrom<String> for MacAddress {
    type Error = error::Error;

    fn try_from(input: String) -> Result<Self> {
        let mut octets = 0;

        for octet in input.split(|b| b == '-' || b == ':') {
            // If we've gotten to 6 and are still iterating, the MAC is too long
            ensure!(
                octets != 6 && octet.len() == 2,
                error::InvalidMacAddressSnafu {
                    input,
                    msg: "must have 6 octets of 2 chars/digits"
                }
            );

            u8::from_str_radix(octet, 16).context(error::InvalidMacAddressCharSnafu {
                input: input.to_string(),
                msg: "invalid character/digit",
            })?;

            octets += 1;
        }

        ensure!(
            octets == 6,
            error::InvalidMacAddressSnafu {
                input,
                msg: "must have 6 octets"
            }
        );

        // systemd accepts either separator, but we always write lowercase and colon-separated so
        // the rendered file doesn't depend on how the address was typed
        Ok(MacAddress {
            inner: input.to_lowercase().replace('-', ":"),
        })
    }
}

impl TryFrom<&str> for MacAddress {
    type Error = error::Error;

    fn try_from(input: &str) -> Result<Self> {
        Self::try_from(input.to_string())
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

mod error {
    use snafu::Snafu;
    use std::num::ParseIntError;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    #[allow(clippy::enum_variant_names)]
    pub(crate) enum Error {
        #[snafu(display("Invalid interface name '{}': {}", input.escape_debug(), msg))]
        InvalidInterfaceName { input: String, msg: String },

        #[snafu(display("Invalid MAC address '{}': {}", input, msg))]
        InvalidMacAddress { input: String, msg: String },

        #[snafu(display("Invalid MAC address '{}': {}: {}", input, msg, source))]
        InvalidMacAddressChar {
            input: String,
            msg: String,
            source: ParseIntError,
        },
    }
}

pub(crate) use error::Error;
type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_interface_name() {
        let bad_str = [
            &"a".repeat(16),
            "",
            ".",
            "..",
            "f/swp1",
            "swp 1",
            "swp1:1",
            "swp\n1",
            "\n",
            "\r",
            "\u{000B}",
            "\u{000C}",
            "\u{0085}",
            "\u{2028}",
            "\u{2029}",
            "swp*",
            "swp?",
            "swp[12]",
            "*",
        ];
        for bad in bad_str {
            let err = InterfaceName::try_from(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidInterfaceName { .. }))
        }
    }

    #[test]
    fn valid_interface_name() {
        let ok_str = [&"a".repeat(15), "swp1", "swp52s3", "eth0", "bond0", "br0"];
        for ok in ok_str {
            assert!(InterfaceName::try_from(ok).is_ok())
        }
    }

    #[test]
    fn interface_name_from_str() {
        let name: InterfaceName = "swp7".parse().unwrap();
        assert_eq!(&*name, "swp7");
        assert!("swp 7".parse::<InterfaceName>().is_err());
    }

    #[test]
    fn valid_mac_address() {
        let ok_str = [
            "52:54:00:79:99:c6",
            "52-54-00-79-99-c6",
            "F8:75:A4:D5:32:64",
            "F8-75-A4-D5-32-64",
        ];
        for ok in ok_str {
            assert!(MacAddress::try_from(ok).is_ok())
        }
    }

    #[test]
    fn mac_address_normalized() {
        let mac = MacAddress::try_from("F8-75-A4-D5-32-64").unwrap();
        assert_eq!(mac.to_string(), "f8:75:a4:d5:32:64")
    }

    #[test]
    fn invalid_mac_address() {
        let bad_str = [
            "",
            ":",
            "52:",
            "52:54:00:79:99:c",
            "52:54:00:79:99:c6:c7",
            "52:54:00:79:99:z6",
        ];
        for bad in bad_str {
            assert!(MacAddress::try_from(bad).is_err())
        }
    }
}
