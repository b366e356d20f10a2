/*!

Macros to serialize structs to the `systemd` unit file format used by `systemd-networkd`
`.network` and `.link` files.

## Description

The `SystemdUnit` and `SystemdUnitSection` macros implement `Display` for structs representing
a unit file and its sections, so a config can be turned into the exact text written to disk with
`to_string()`.

`systemd` differs from standard INI in that duplicate sections are allowed, along with duplicate
keys within a section.  The macros expect a "top-level" struct representing the file, whose
fields are the sections, and one struct per section whose fields are the key/value pairs.

All fields must be `Option`s or `Vec`s of a type implementing `Display`.  For `SystemdUnit`
structs a `Vec` field is a repeated section; for `SystemdUnitSection` structs a `Vec` field is a
repeated entry.  `None` and empty `Vec`s are not written.

Sections are separated by a single blank line and every entry ends with a newline, matching the
layout `networkctl cat` shows for hand-written files.

## Parameters

`SystemdUnit` takes no parameters.

`SystemdUnitSection` requires:
- `section`: the section name, set on the struct.  Brackets are added for you.
- `entry`: the configuration key, set on every field.

`SystemdUnitSection` also emits an associated `SECTION` constant holding the section name, which
is handy when reading the same section back from disk.

# Example

```ignore
use systemd_derive::{SystemdUnit, SystemdUnitSection};

#[derive(Debug, Default, SystemdUnit)]
struct NetworkConfig {
    r#match: Option<MatchSection>,
    bridge_vlan: Vec<BridgeVlanSection>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "Match")]
struct MatchSection {
    #[systemd(entry = "Name")]
    name: Option<String>,
}

#[derive(Debug, Default, SystemdUnitSection)]
#[systemd(section = "BridgeVLAN")]
struct BridgeVlanSection {
    #[systemd(entry = "VLAN")]
    vlans: Vec<u16>,
    #[systemd(entry = "PVID")]
    pvid: Option<u16>,
}

let cfg = NetworkConfig {
    r#match: Some(MatchSection {
        name: Some("swp2".to_string()),
    }),
    bridge_vlan: vec![BridgeVlanSection {
        vlans: vec![10, 20],
        pvid: Some(10),
    }],
};

println!("{}", cfg);
```

Prints:
```ignore
[Match]
Name=swp2

[BridgeVLAN]
VLAN=10
VLAN=20
PVID=10
```
*/

use darling::{ast, FromDeriveInput, FromField, ToTokens};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident};

/// Derive `Display` for a struct representing a whole unit file.  See the crate documentation.
#[proc_macro_derive(SystemdUnit)]
pub fn derive_systemd_unit(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match SystemdUnit::from_derive_input(&ast) {
        Ok(unit) => quote!(#unit).into(),
        Err(e) => e.write_errors().into(),
    }
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named))]
struct SystemdUnit {
    ident: Ident,
    data: ast::Data<(), SystemdSection>,
}

#[derive(Debug, FromField)]
struct SystemdSection {
    ident: Option<Ident>,
}

impl ToTokens for SystemdUnit {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let SystemdUnit { ident, data } = self;

        let sections: Vec<&Ident> = data
            .as_ref()
            .take_struct()
            // supports(struct_named) guarantees a struct with named fields
            .expect("Will never be anything but a struct")
            .fields
            .iter()
            .filter_map(|f| f.ident.as_ref())
            .collect();

        tokens.extend(quote! {
            impl std::fmt::Display for #ident {
                #[allow(unused_mut, unused_assignments)]
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    let mut first = true;
                    // `Vec`s and `Option`s both iterate, so repeated and optional sections share
                    // the same code
                    #(for section in self.#sections.iter() {
                        if !first {
                            writeln!(f)?;
                        }
                        first = false;
                        write!(f, "{}", section)?;
                    })*
                    Ok(())
                }
            }
        });
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Derive `Display` for a struct representing one section of a unit file.  See the crate
/// documentation.
#[proc_macro_derive(SystemdUnitSection, attributes(systemd))]
pub fn derive_systemd_unit_section(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match SystemdUnitSection::from_derive_input(&ast) {
        Ok(section) => quote!(#section).into(),
        Err(e) => e.write_errors().into(),
    }
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named))]
#[darling(attributes(systemd))]
struct SystemdUnitSection {
    ident: Ident,
    data: ast::Data<(), SystemdUnitSectionField>,
    #[darling(rename = "section")]
    section_name: String,
}

#[derive(Debug, FromField)]
#[darling(attributes(systemd))]
struct SystemdUnitSectionField {
    ident: Option<Ident>,
    entry: String,
}

impl ToTokens for SystemdUnitSection {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let SystemdUnitSection {
            ident,
            data,
            section_name,
        } = self;

        let entries = data
            .as_ref()
            .take_struct()
            .expect("Will never be anything but a struct")
            .fields;

        // The brackets are ours to add
        let section_name = section_name.replace(['[', ']'], "");

        tokens.extend(quote! {
            impl #ident {
                /// Name of the unit file section this struct represents
                #[allow(dead_code)]
                pub(crate) const SECTION: &'static str = #section_name;
            }

            impl std::fmt::Display for #ident {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    writeln!(f, "[{}]", #section_name)?;
                    #(#entries)*
                    Ok(())
                }
            }
        });
    }
}

impl ToTokens for SystemdUnitSectionField {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let struct_field_name = self.ident.as_ref().expect("Should always have a name");
        let systemd_entry_name = &self.entry;

        tokens.extend(quote! {
            for value in self.#struct_field_name.iter() {
                writeln!(f, "{}={}", #systemd_entry_name, value)?;
            }
        })
    }
}
