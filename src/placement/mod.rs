//! Placement extraction — blocks, placed objects, and the unused remainder.
//!
//! This is the core of the crate. [`PlacementSummary::parse`] runs two passes over
//! the `PLACEMENT SUMMARY` section text:
//!
//! 1. **Block geometry** — every `place in` declaration becomes one [`Block`] with
//!    its address range(s), declared size, and semantic tags.
//! 2. **Object listings** — every block content listing is scanned line by line;
//!    matching lines become [`PlacedObject`] rows, and after a block's real rows
//!    one synthetic `unused` row accounts for the remainder of its declared size.
//!
//! Per-line grammar failures are logged and skipped; broken invariants (duplicate
//! addresses, kind-modifier drift) abort the parse. All tables are immutable once
//! built, and parsing the same text twice yields identical tables.

pub mod grammar;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::modules::ModuleTable;
use crate::placement::grammar::{Grammar, GrammarVersion, ObjectLine};
use crate::Result;

/// Marker prefix for compiler-generated entries without a real symbol name.
const SYNTHETIC_NAME_MARKER: char = '<';

/// Read-only vs read-write classification of a block or object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindModifier {
    /// Read-only: code and constants.
    Ro,
    /// Read-write: data, stacks, heaps.
    Rw,
}

impl KindModifier {
    /// Parse the two-character column abbreviation.
    pub fn from_word(word: &str) -> Option<KindModifier> {
        match word {
            "ro" => Some(KindModifier::Ro),
            "rw" => Some(KindModifier::Rw),
            _ => None,
        }
    }

    /// The column abbreviation, as printed in the map file.
    pub fn as_str(&self) -> &'static str {
        match self {
            KindModifier::Ro => "ro",
            KindModifier::Rw => "rw",
        }
    }
}

impl std::fmt::Display for KindModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a placed object holds.
///
/// Lines with no kind word, or a kind word outside this set, carry no
/// size-accounting meaning and are dropped from the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Executable code.
    Code,
    /// Initialized data.
    Data,
    /// Read-only constants.
    Const,
    /// Data initialized by the startup copy loop.
    Inited,
    /// Uninitialized data.
    Uninit,
    /// Zero-initialized data.
    Zero,
    /// Synthetic remainder of a block's declared size.
    Unused,
}

impl ObjectKind {
    /// Map a listing-line kind word to its kind, `None` for unrecognized words.
    pub fn from_word(word: &str) -> Option<ObjectKind> {
        match word {
            "code" => Some(ObjectKind::Code),
            "data" => Some(ObjectKind::Data),
            "const" => Some(ObjectKind::Const),
            "inited" => Some(ObjectKind::Inited),
            "uninit" => Some(ObjectKind::Uninit),
            "zero" => Some(ObjectKind::Zero),
            "unused" => Some(ObjectKind::Unused),
            _ => None,
        }
    }

    /// The kind word, as printed in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Code => "code",
            ObjectKind::Data => "data",
            ObjectKind::Const => "const",
            ObjectKind::Inited => "inited",
            ObjectKind::Uninit => "uninit",
            ObjectKind::Zero => "zero",
            ObjectKind::Unused => "unused",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The label of the code block. Everything else is treated as read-write.
const CODE_BLOCK: &str = "P1";

/// A named memory region declared by the linker.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// The two-character block label, e.g. `P1`.
    pub name: String,
    /// Start of the (first) address range.
    pub start: u64,
    /// End of the (first) address range.
    pub end: u64,
    /// Declared size: range span, widened by the second range's span when the
    /// block is split across two physical regions.
    pub size: u64,
    /// Second disjoint address range for split blocks.
    pub second: Option<(u64, u64)>,
    /// Semantic section tags, e.g. `CSTACK`, `HEAP`.
    pub tags: Vec<String>,
}

impl Block {
    /// The modifier every listing line of this block must agree with.
    ///
    /// Derived from the declaration tags when they carry `ro`/`rw`, otherwise
    /// from block identity: the code block is read-only, all others read-write.
    pub fn expected_modifier(&self) -> KindModifier {
        for tag in &self.tags {
            if let Some(modifier) = KindModifier::from_word(tag) {
                return modifier;
            }
        }
        if self.name == CODE_BLOCK {
            KindModifier::Ro
        } else {
            KindModifier::Rw
        }
    }
}

/// One linker-placed entity within a block, or the synthetic `unused` remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedObject {
    /// Label of the owning block.
    pub block: String,
    /// Section name, e.g. `.text`.
    pub section: String,
    /// Kind classification.
    pub kind: ObjectKind,
    /// Size in bytes.
    pub size: u64,
    /// Originating module name, resolved through the module table when the
    /// listing carried a numeric reference.
    pub module: String,
    /// Human-readable object/symbol name.
    pub object: String,
    /// Placement address. Only a uniqueness key within one parse; it is not part
    /// of any rendered report row.
    #[serde(skip)]
    pub addr: u64,
}

/// The parsed placement tables of one map file.
///
/// Owned by one parse session and read-only once constructed.
#[derive(Debug, Clone)]
pub struct PlacementSummary {
    /// Blocks keyed by label. Labels are unique within one parse.
    pub blocks: BTreeMap<String, Block>,
    /// All placed objects across all blocks: real rows in listing order, then
    /// one `unused` remainder row per block that produced a listing.
    pub objects: Vec<PlacedObject>,
    /// The grammar generation the text was parsed with.
    pub version: GrammarVersion,
}

impl PlacementSummary {
    /// Parse the `PLACEMENT SUMMARY` text, auto-detecting the grammar generation.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateAddress`] when two rows resolve to the
    /// same address and [`crate::Error::KindModifierMismatch`] when a listing
    /// line contradicts its block's ro/rw identity.
    pub fn parse(text: &str, modules: &ModuleTable) -> Result<PlacementSummary> {
        Self::parse_with(Grammar::detect(text), text, modules)
    }

    /// Parse with an explicitly selected grammar generation.
    ///
    /// # Errors
    /// Same failure modes as [`PlacementSummary::parse`].
    pub fn parse_with(
        grammar: &Grammar,
        text: &str,
        modules: &ModuleTable,
    ) -> Result<PlacementSummary> {
        let blocks = parse_blocks(grammar, text);
        let objects = parse_objects(grammar, text, &blocks, modules)?;
        Ok(PlacementSummary {
            blocks,
            objects,
            version: grammar.version(),
        })
    }

    /// All objects belonging to one block, in listing order.
    pub fn objects_in<'a>(&'a self, block: &'a str) -> impl Iterator<Item = &'a PlacedObject> {
        self.objects.iter().filter(move |obj| obj.block == block)
    }
}

// Pass A: collect block geometry from the place-in declarations.
fn parse_blocks(grammar: &Grammar, text: &str) -> BTreeMap<String, Block> {
    let mut blocks = BTreeMap::new();
    for stmt in grammar.place_statements(text) {
        let span = stmt.end.saturating_sub(stmt.start);
        let second_span = stmt
            .second
            .map(|(s, e)| e.saturating_sub(s))
            .unwrap_or(0);
        let block = Block {
            name: stmt.label.clone(),
            start: stmt.start,
            end: stmt.end,
            size: span + second_span,
            second: stmt.second,
            tags: stmt.tags,
        };
        log::debug!(
            "block {} spans {:#010x}..{:#010x} ({} bytes, tags {:?})",
            block.name,
            block.start,
            block.end,
            block.size,
            block.tags
        );
        // Labels are unique per parse; a redeclaration keeps the later geometry.
        blocks.insert(stmt.label, block);
    }
    blocks
}

// Running listing state for one block across its (possibly multiple) parts.
#[derive(Default)]
struct BlockTally {
    used: u64,
    last_end: Option<u64>,
}

// Pass B: scan the content listings line by line.
fn parse_objects(
    grammar: &Grammar,
    text: &str,
    blocks: &BTreeMap<String, Block>,
    modules: &ModuleTable,
) -> Result<Vec<PlacedObject>> {
    let mut objects = Vec::new();
    let mut seen: HashMap<u64, String> = HashMap::new();
    let mut tallies: BTreeMap<String, BlockTally> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(header) = grammar.content_header(line) {
            if !blocks.contains_key(&header.label) {
                return Err(malformed_error!(
                    "content listing for undeclared block \"{}\"",
                    header.label
                ));
            }
            if let Some((n, m)) = header.part {
                log::debug!("block {} listing part {n} of {m}", header.label);
            }
            tallies.entry(header.label.clone()).or_default();
            current = Some(header.label);
            continue;
        }

        let Some(label) = current.as_deref() else {
            continue;
        };

        if let Some(end) = grammar.content_end(line) {
            if let Some(tally) = tallies.get_mut(label) {
                tally.last_end = Some(end.end);
            }
            current = None;
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match grammar.object_line(line) {
            Some(obj) => {
                let block = &blocks[label];
                if let Some(placed) = admit_object(block, obj, modules, &mut seen)? {
                    tallies.entry(label.to_string()).or_default().used += placed.size;
                    objects.push(placed);
                }
            }
            None => {
                log::warn!("unparseable listing line in block \"{label}\": {line:?}");
            }
        }
    }

    // One unused remainder per block that produced a listing.
    for (label, tally) in &tallies {
        let block = &blocks[label.as_str()];
        let Some(unused_size) = block.size.checked_sub(tally.used) else {
            log::warn!(
                "block \"{label}\" listing exceeds its declared size ({} > {}), no unused row",
                tally.used,
                block.size
            );
            continue;
        };
        if unused_size == 0 {
            continue;
        }
        let addr = tally.last_end.unwrap_or(block.end);
        if seen.contains_key(&addr) {
            return Err(crate::Error::DuplicateAddress {
                address: addr,
                block: label.clone(),
            });
        }
        seen.insert(addr, label.clone());
        objects.push(PlacedObject {
            block: label.clone(),
            section: "unused".to_string(),
            kind: ObjectKind::Unused,
            size: unused_size,
            module: "unused".to_string(),
            object: "unused".to_string(),
            addr,
        });
    }

    Ok(objects)
}

// Apply the semantic filters to one matched listing line. Returns Ok(None) for
// rows that are dropped (no kind, zero size), an error for broken invariants.
fn admit_object(
    block: &Block,
    obj: ObjectLine<'_>,
    modules: &ModuleTable,
    seen: &mut HashMap<u64, String>,
) -> Result<Option<PlacedObject>> {
    let Some(kind) = obj.kind.and_then(ObjectKind::from_word) else {
        return Ok(None);
    };
    if obj.size == 0 {
        return Ok(None);
    }

    if let Some(found) = obj.kind_mod {
        let expected = block.expected_modifier();
        if found != expected {
            return Err(crate::Error::KindModifierMismatch {
                block: block.name.clone(),
                expected,
                found,
            });
        }
    }

    if seen.contains_key(&obj.addr) {
        return Err(crate::Error::DuplicateAddress {
            address: obj.addr,
            block: block.name.clone(),
        });
    }
    seen.insert(obj.addr, block.name.clone());

    let module = match obj.module_ref {
        Some(id) => match modules.resolve(id) {
            Some(name) => name.to_string(),
            None => {
                log::warn!("module reference [{id}] not in module table, kept numeric");
                format!("[{id}]")
            }
        },
        None => obj.descriptor.to_string(),
    };

    // Compiler-generated blobs have no real symbol name; fall back to the section.
    let object = if obj.descriptor.starts_with(SYNTHETIC_NAME_MARKER) {
        obj.section.to_string()
    } else {
        obj.descriptor.to_string()
    };

    Ok(Some(PlacedObject {
        block: block.name.clone(),
        section: obj.section.to_string(),
        kind,
        size: obj.size,
        module,
        object,
        addr: obj.addr,
    }))
}
