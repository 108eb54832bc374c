//! Module table extraction from the `MODULE SUMMARY` section.
//!
//! Placement listing lines reference their originating object file by a small
//! bracketed integer; the module summary maps those integers back to file names.
//! Slot 1 is never present in the text — by convention it belongs to the overall
//! executable, so it is pre-populated with a caller-supplied device label.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback device label when the caller does not supply one.
pub const DEFAULT_DEVICE: &str = "device";

// Matches one module summary entry:
//     SensorFusionMobile.cpp.obj: [6]
static MODULE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\S.*?):\s+\[\s*(\d+)\s*\]\s*$").unwrap());

/// The integer-ID to module-name mapping for one parse session.
///
/// Built once from the `MODULE SUMMARY` section and immutable afterwards. IDs are
/// expected unique; a duplicate ID silently keeps the later entry. Names are not
/// checked for uniqueness at all.
#[derive(Debug, Clone)]
pub struct ModuleTable {
    names: BTreeMap<u32, String>,
}

impl ModuleTable {
    /// The reserved slot for the overall device/executable.
    pub const DEVICE_SLOT: u32 = 1;

    /// Build a table containing only the synthetic device entry.
    pub fn empty(devname: &str) -> ModuleTable {
        let mut names = BTreeMap::new();
        names.insert(Self::DEVICE_SLOT, devname.to_string());
        ModuleTable { names }
    }

    /// Parse every `<name>: [<id>]` line of the module summary text.
    ///
    /// The device label lands in slot 1 first; an explicit (unexpected) text
    /// entry for ID 1 would overwrite it, consistent with last-entry-wins.
    pub fn parse(text: &str, devname: &str) -> ModuleTable {
        let mut table = ModuleTable::empty(devname);
        for caps in MODULE_LINE.captures_iter(text) {
            let name = caps.get(1).unwrap().as_str().trim().to_string();
            // \d+ can still overflow u32 on absurd input; such lines are noise
            let Ok(id) = caps.get(2).unwrap().as_str().parse::<u32>() else {
                log::warn!("module summary entry with unusable id: {}", &caps[0]);
                continue;
            };
            table.names.insert(id, name);
        }
        log::debug!("module table holds {} entries", table.names.len());
        table
    }

    /// Resolve a module ID to its name.
    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// The device label occupying slot 1.
    pub fn device(&self) -> &str {
        self.names
            .get(&Self::DEVICE_SLOT)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DEVICE)
    }

    /// Number of known modules, including the synthetic device entry.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` only if even the device slot is missing (never after construction).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
