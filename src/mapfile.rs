//! The map-file parse session.
//!
//! [`MapFile`] ties the pipeline together: read the whole file, split it into
//! sections, build the module table from `MODULE SUMMARY` (when present), and
//! parse `PLACEMENT SUMMARY` into the block and object tables. Everything is
//! one synchronous pass over in-memory text; the resulting tables are read-only.

use std::path::Path;

use crate::modules::{ModuleTable, DEFAULT_DEVICE};
use crate::placement::PlacementSummary;
use crate::report::SizeReport;
use crate::sections::Sections;
use crate::Result;

/// A fully parsed map file.
#[derive(Debug, Clone)]
pub struct MapFile {
    /// The named top-level sections of the raw text.
    pub sections: Sections,
    /// Module ID to name mapping, device label in slot 1.
    pub modules: ModuleTable,
    /// Block geometry and the placed-object table.
    pub placement: PlacementSummary,
}

impl MapFile {
    /// Section title the placement parser requires.
    pub const PLACEMENT_SECTION: &'static str = "PLACEMENT SUMMARY";
    /// Section title the module table is built from, optional.
    pub const MODULE_SECTION: &'static str = "MODULE SUMMARY";

    /// Read and parse a map file from disk.
    ///
    /// When `devname` is `None` the device label defaults to the file's base
    /// name up to its first `.` (so `FSP312.map` reports as `FSP312`).
    ///
    /// # Errors
    /// I/O failures surface as [`crate::Error::FileError`]; parse failures as in
    /// [`MapFile::parse`].
    pub fn from_file(path: &Path, devname: Option<&str>) -> Result<MapFile> {
        let text = std::fs::read_to_string(path)?;
        let derived = devname_from_path(path);
        let devname = devname.unwrap_or(derived.as_deref().unwrap_or(DEFAULT_DEVICE));
        Self::parse(&text, devname)
    }

    /// Parse map-file text already in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingSection`] when the text has no
    /// `PLACEMENT SUMMARY` section, plus the placement parser's consistency
    /// failures ([`crate::Error::DuplicateAddress`],
    /// [`crate::Error::KindModifierMismatch`]).
    pub fn parse(text: &str, devname: &str) -> Result<MapFile> {
        let sections = Sections::parse(text);

        let modules = match sections.get(Self::MODULE_SECTION) {
            Some(body) => ModuleTable::parse(body, devname),
            None => ModuleTable::empty(devname),
        };

        let placement_text = sections.require(Self::PLACEMENT_SECTION)?;
        let placement = PlacementSummary::parse(placement_text, &modules)?;

        Ok(MapFile {
            sections,
            modules,
            placement,
        })
    }

    /// The device label this parse session runs under.
    pub fn device(&self) -> &str {
        self.modules.device()
    }

    /// Aggregate this file's tables into a size report.
    pub fn report(&self) -> SizeReport {
        SizeReport::new(self.device(), &self.placement)
    }
}

/// File base name up to the first `.`, the conventional device label.
pub fn devname_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next().unwrap_or(name);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
