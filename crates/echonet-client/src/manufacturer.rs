//! Manufacturer code to vendor name resolution.

use echonet_core::types::ManufacturerCode;
use echonet_datalink::NodeAddress;
use std::collections::HashMap;

/// Name reported for devices whose manufacturer cannot be resolved.
pub const FALLBACK_MANUFACTURER: &str = "ECHONETLite";

/// Vendor codes published by the ECHONET Consortium, sorted by code.
const KNOWN_VENDORS: &[(u32, &str)] = &[
    (0x00_0005, "Sharp"),
    (0x00_0006, "Mitsubishi Electric"),
    (0x00_0008, "Daikin"),
    (0x00_000B, "Panasonic"),
    (0x00_0016, "Toshiba"),
    (0x00_008A, "Fujitsu General"),
];

/// Manufacturer of an object instance as recorded from its identification
/// data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Manufacturer {
    Resolved(String),
    /// Raw EDT that did not map to a known vendor. Empty when the device
    /// reported no manufacturer at all.
    Unresolved(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct ManufacturerResolver {
    extra: HashMap<u32, String>,
}

impl ManufacturerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overrides a vendor name.
    pub fn with_vendor(mut self, code: ManufacturerCode, name: impl Into<String>) -> Self {
        self.extra.insert(code.raw(), name.into());
        self
    }

    pub fn lookup(&self, code: ManufacturerCode) -> Option<&str> {
        if let Some(name) = self.extra.get(&code.raw()) {
            return Some(name.as_str());
        }
        KNOWN_VENDORS
            .binary_search_by_key(&code.raw(), |(raw, _)| *raw)
            .ok()
            .map(|idx| KNOWN_VENDORS[idx].1)
    }

    /// Resolves a raw manufacturer EDT. Anything other than a 3-byte known
    /// code stays [`Manufacturer::Unresolved`] with the raw bytes.
    pub fn resolve(&self, raw: &[u8]) -> Manufacturer {
        ManufacturerCode::from_edt(raw)
            .ok()
            .and_then(|code| self.lookup(code))
            .map(|name| Manufacturer::Resolved(name.to_string()))
            .unwrap_or_else(|| Manufacturer::Unresolved(raw.to_vec()))
    }

    /// Name to present for `manufacturer`, falling back to
    /// [`FALLBACK_MANUFACTURER`] with a warning so the gap can be reported.
    pub fn display_name(&self, host: NodeAddress, manufacturer: &Manufacturer) -> String {
        match manufacturer {
            Manufacturer::Resolved(name) => name.clone(),
            Manufacturer::Unresolved(raw) => {
                log::warn!(
                    "{host} - unable to resolve the manufacturer name - {}. \
                     Please report the manufacturer name of your device.",
                    describe_raw(raw)
                );
                FALLBACK_MANUFACTURER.to_string()
            }
        }
    }

    /// Convenience for callers holding a bare code.
    pub fn resolve_name(&self, host: NodeAddress, raw: &[u8]) -> String {
        self.display_name(host, &self.resolve(raw))
    }
}

fn describe_raw(raw: &[u8]) -> String {
    match ManufacturerCode::from_edt(raw) {
        Ok(code) => code.to_string(),
        Err(_) if raw.is_empty() => "none reported".to_string(),
        Err(_) => format!("malformed {raw:02x?}"),
    }
}
