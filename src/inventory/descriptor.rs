//! libvirt domain XML descriptors.

use roxmltree::{Document, Node};

use crate::domain::{DomainRef, HardwareAddress, ManagedMachine};
use crate::error::DescriptorError;

/// What the daemon needs from a domain's XML description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainDescriptor {
    pub name: Option<String>,
    pub uuid: Option<String>,
    /// `/domain/devices/interface/mac/@address`, in document order.
    pub addresses: Vec<HardwareAddress>,
}

impl DomainDescriptor {
    /// Parse a `<domain>` document.
    ///
    /// Interface addresses that do not parse are skipped with a warning so
    /// that one odd interface does not hide the others.
    pub fn parse(xml: &str) -> Result<Self, DescriptorError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if !root.has_tag_name("domain") {
            return Err(DescriptorError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let addresses = child_elements(root, "devices")
            .flat_map(|devices| child_elements(devices, "interface"))
            .flat_map(|iface| child_elements(iface, "mac"))
            .filter_map(|mac| mac.attribute("address"))
            .filter_map(|raw| match raw.parse::<HardwareAddress>() {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::warn!("Ignoring interface: {}", e);
                    None
                }
            })
            .collect();

        Ok(Self {
            name: child_text(root, "name"),
            uuid: child_text(root, "uuid"),
            addresses,
        })
    }

    /// Combine with the enumerated reference into a managed machine.
    pub fn into_machine(self, domain: &DomainRef) -> ManagedMachine {
        let name = self
            .name
            .or_else(|| domain.name.clone())
            .unwrap_or_else(|| domain.id.to_string());
        ManagedMachine::new(domain.id.clone(), name, self.addresses)
    }
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(name))
}

fn child_text(node: Node<'_, '_>, name: &'static str) -> Option<String> {
    child_elements(node, name)
        .next()
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
