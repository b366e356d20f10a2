use systemd_derive::{SystemdUnit, SystemdUnitSection};

#[derive(Debug, Default, SystemdUnit)]
struct NetworkConfig {
    r#match: Option<MatchSection>,
    network: Option<NetworkSection>,
    bridge_vlan: Vec<BridgeVlanSection>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Match")]
struct MatchSection {
    #[systemd(entry = "Name")]
    name: Option<String>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Network")]
struct NetworkSection {
    #[systemd(entry = "Bridge")]
    bridge: Option<String>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "[BridgeVLAN]")]
struct BridgeVlanSection {
    #[systemd(entry = "VLAN")]
    vlans: Vec<u16>,
    #[systemd(entry = "PVID")]
    pvid: Option<u16>,
}

#[test]
fn empty() {
    let n = NetworkConfig::default();
    assert_eq!(n.to_string(), "")
}

#[test]
fn empty_section_writes_header_only() {
    let n = NetworkConfig {
        network: Some(NetworkSection::default()),
        ..Default::default()
    };
    assert_eq!(n.to_string(), "[Network]\n")
}

// Repeated entries, repeated sections and blank-line separation
#[test]
fn all_features() {
    let n = NetworkConfig {
        r#match: Some(MatchSection {
            name: Some("swp1".to_string()),
        }),
        network: Some(NetworkSection {
            bridge: Some("br0".to_string()),
        }),
        bridge_vlan: vec![
            BridgeVlanSection {
                vlans: vec![10, 20],
                pvid: None,
            },
            BridgeVlanSection {
                vlans: vec![],
                pvid: Some(30),
            },
        ],
    };

    let expected = "[Match]
Name=swp1

[Network]
Bridge=br0

[BridgeVLAN]
VLAN=10
VLAN=20

[BridgeVLAN]
PVID=30
";

    assert_eq!(n.to_string(), expected)
}

// A missing leading section must not leave a stray separator
#[test]
fn skipped_sections() {
    let n = NetworkConfig {
        r#match: None,
        network: None,
        bridge_vlan: vec![BridgeVlanSection {
            vlans: vec![5],
            pvid: Some(5),
        }],
    };

    assert_eq!(n.to_string(), "[BridgeVLAN]\nVLAN=5\nPVID=5\n")
}

#[test]
fn section_constant() {
    assert_eq!(MatchSection::SECTION, "Match");
    assert_eq!(BridgeVlanSection::SECTION, "BridgeVLAN");
}
