//! Versioned grammars for the `PLACEMENT SUMMARY` text.
//!
//! The toolchain's placement output changed shape twice over its lifetime, so the
//! statement regexes live behind one [`Grammar`] type with a compiled instance per
//! generation. [`Grammar::detect`] inspects the text for the distinguishing
//! features of each generation and picks the newest one that applies; callers can
//! also force a version explicitly via [`Grammar::get`].
//!
//! | version | address ranges            | object-line layout              |
//! |---------|---------------------------|---------------------------------|
//! | v1      | single `[from .. to ..]`  | no ro/rw column, no block parts |
//! | v2      | single `[from .. to ..]`  | ro/rw column, `part n of m`     |
//! | v3      | `\|`-joined second range, `_`-grouped hex | as v2           |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::placement::KindModifier;

macro_rules! static_regex {
    ($name:ident, $str:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($str).unwrap());
    };
}

// Version-detection probes. Each matches a feature only a particular
// generation emits.
static_regex!(SECOND_RANGE, r"\]\s*\|\s*\[from ");
static_regex!(GROUPED_HEX, r"0x[0-9a-fA-F]+_[0-9a-fA-F]");
static_regex!(MOD_COLUMN, r"(?m)^\s.{20}\s+(?:ro|rw)\s+(?:[a-z]+\s+)?0x[0-9a-f]");
static_regex!(PART_HEADER, r#"(?m)^"[A-Z0-9]{2}", part \d+ of \d+:"#);
static_regex!(BARE_OBJECT, r"(?m)^\s.{20}\s+[a-z]+\s+0x[0-9a-f]{8}\s+0x[0-9a-f]{1,6}\s\s");

// Pass A: block placement declarations.
//     "P2":  place in [from 0x20000000 to 0x20007fff] {
//               rw, block CSTACK, block HEAP, section .noinit };
// v3 additionally accepts `_`-grouped hex digits and a second disjoint range:
//     "P1":  place in [from 0x0800_0000 to 0x0807_ffff] |
//                     [from 0x0810_0000 to 0x0810_7fff] { ro, code };
static_regex!(
    PLACE_V12,
    r#""([A-Z0-9]{2})":\s+place in\s+\[from 0x([0-9a-fA-F]+) to 0x([0-9a-fA-F]+)\]\s*\{([^{}]+)\};"#
);
static_regex!(
    PLACE_V3,
    r#""([A-Z0-9]{2})":\s+place in\s+\[from 0x([0-9a-fA-F_]+) to 0x([0-9a-fA-F_]+)\](?:\s*\|\s*\[from 0x([0-9a-fA-F_]+) to 0x([0-9a-fA-F_]+)\])?\s*\{([^{}]+)\};"#
);

// Pass B: block content headers.
//     "P1":                                      0x2ce6b
//     "P1", part 2 of 3:                         0x1a00
static_regex!(HEADER_V1, r#"^"([A-Z0-9]{2})":\s+0x([0-9a-f]+)\s*$"#);
static_regex!(
    HEADER_V23,
    r#"^"([A-Z0-9]{2})"(?:, part (\d+) of (\d+))?:\s+0x([0-9a-f_]+)\s*$"#
);

// Pass B: closing line of a block's object list.
//                              - 0x20007588   0x7588
static_regex!(END_V12, r"^\s+-\s+0x([0-9a-f]+)\s+0x([0-9a-f]+)\s*$");
static_regex!(END_V3, r"^\s+-\s+0x([0-9a-f_]+)\s+0x([0-9a-f_]+)\s*$");

// Pass B: one placed-object listing line.
//     .text               ro code  0x000040a0   0x288c  SensorFusionMobile.cpp.obj [6]
// The name/section field is fixed at 20 columns; the ro/rw column and the kind
// word are both optional; the descriptor may end in a bracketed module reference.
static_regex!(
    OBJECT_V1,
    r"^\s(.{20})(?:\s+([a-z]+))?\s+0x([0-9a-f]{8})\s+0x([0-9a-f]{1,6})\s\s\s*([A-Za-z0-9._<>/: -]+?)(?:\s+\[(\d+)\])?\s*$"
);
static_regex!(
    OBJECT_V2,
    r"^\s(.{20})(?:\s+(ro|rw))?(?:\s+([a-z]+))?\s+0x([0-9a-f]{8})\s+0x([0-9a-f]{1,6})\s\s\s*([A-Za-z0-9._<>/: -]+?)(?:\s+\[(\d+)\])?\s*$"
);
static_regex!(
    OBJECT_V3,
    r"^\s(.{20})(?:\s+(ro|rw))?(?:\s+([a-z]+))?\s+0x([0-9a-f_]{8,11})\s+0x([0-9a-f_]{1,8})\s\s\s*([A-Za-z0-9._<>/: -]+?)(?:\s+\[(\d+)\])?\s*$"
);

/// The three placement-grammar generations, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GrammarVersion {
    /// Original output: single ranges, no ro/rw column.
    V1,
    /// Adds the ro/rw column and multi-part block listings.
    V2,
    /// Adds `|`-joined split ranges and `_`-grouped hex literals.
    V3,
}

impl std::fmt::Display for GrammarVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarVersion::V1 => write!(f, "v1"),
            GrammarVersion::V2 => write!(f, "v2"),
            GrammarVersion::V3 => write!(f, "v3"),
        }
    }
}

/// One compiled grammar generation.
///
/// Holds the statement regexes for its version and exposes structured capture
/// types so the placement parser never touches raw capture groups.
pub struct Grammar {
    version: GrammarVersion,
    place: &'static Lazy<Regex>,
    header: &'static Lazy<Regex>,
    end: &'static Lazy<Regex>,
    object: &'static Lazy<Regex>,
}

static GRAMMAR_V1: Grammar = Grammar {
    version: GrammarVersion::V1,
    place: &PLACE_V12,
    header: &HEADER_V1,
    end: &END_V12,
    object: &OBJECT_V1,
};

static GRAMMAR_V2: Grammar = Grammar {
    version: GrammarVersion::V2,
    place: &PLACE_V12,
    header: &HEADER_V23,
    end: &END_V12,
    object: &OBJECT_V2,
};

static GRAMMAR_V3: Grammar = Grammar {
    version: GrammarVersion::V3,
    place: &PLACE_V3,
    header: &HEADER_V23,
    end: &END_V3,
    object: &OBJECT_V3,
};

/// A matched `place in` declaration (pass A).
#[derive(Debug)]
pub(crate) struct PlaceStmt {
    pub label: String,
    pub start: u64,
    pub end: u64,
    /// Second disjoint range for split blocks (v3 only).
    pub second: Option<(u64, u64)>,
    /// Semantic tags, already chopped to the last word of each phrase.
    pub tags: Vec<String>,
}

/// A matched block content header (pass B).
#[derive(Debug)]
pub(crate) struct ContentHeader {
    pub label: String,
    /// `part n of m` annotation, accepted but never creating a separate block.
    pub part: Option<(u32, u32)>,
}

/// The closing `- <end> <size>` line of a block listing (pass B).
#[derive(Debug)]
pub(crate) struct ContentEnd {
    pub end: u64,
}

/// One matched object listing line (pass B), before any semantic filtering.
#[derive(Debug)]
pub(crate) struct ObjectLine<'a> {
    pub section: &'a str,
    pub kind_mod: Option<KindModifier>,
    pub kind: Option<&'a str>,
    pub addr: u64,
    pub size: u64,
    pub descriptor: &'a str,
    pub module_ref: Option<u32>,
}

/// Parse a hex field, tolerating the `_` digit grouping newer output emits.
pub(crate) fn parse_hex(digits: &str) -> Option<u64> {
    if digits.contains('_') {
        let compact: String = digits.chars().filter(|c| *c != '_').collect();
        u64::from_str_radix(&compact, 16).ok()
    } else {
        u64::from_str_radix(digits, 16).ok()
    }
}

// "block HEAP" -> "HEAP", "section .noinit" -> ".noinit", "ro" -> "ro"
fn chop_tag(phrase: &str) -> Option<String> {
    phrase
        .split_whitespace()
        .last()
        .map(|word| word.to_string())
}

impl Grammar {
    /// The compiled grammar for a given version.
    pub fn get(version: GrammarVersion) -> &'static Grammar {
        match version {
            GrammarVersion::V1 => &GRAMMAR_V1,
            GrammarVersion::V2 => &GRAMMAR_V2,
            GrammarVersion::V3 => &GRAMMAR_V3,
        }
    }

    /// Pick the newest grammar whose distinguishing features appear in `text`.
    ///
    /// Split ranges or grouped hex force v3; a ro/rw column or a `part n of m`
    /// header forces v2; object lines without either marker select v1. Text with
    /// no object lines at all defaults to v2, the most common generation.
    pub fn detect(text: &str) -> &'static Grammar {
        let version = if SECOND_RANGE.is_match(text) || GROUPED_HEX.is_match(text) {
            GrammarVersion::V3
        } else if MOD_COLUMN.is_match(text) || PART_HEADER.is_match(text) {
            GrammarVersion::V2
        } else if BARE_OBJECT.is_match(text) {
            GrammarVersion::V1
        } else {
            GrammarVersion::V2
        };
        log::debug!("placement grammar detected as {version}");
        Grammar::get(version)
    }

    /// This grammar's generation.
    pub fn version(&self) -> GrammarVersion {
        self.version
    }

    /// Iterate every `place in` declaration in the section text.
    pub(crate) fn place_statements<'t>(
        &self,
        text: &'t str,
    ) -> impl Iterator<Item = PlaceStmt> + 't {
        let v3 = self.version == GrammarVersion::V3;
        let re: &'static Regex = self.place;
        re.captures_iter(text).filter_map(move |caps| {
            let label = caps.get(1)?.as_str().to_string();
            let start = parse_hex(caps.get(2)?.as_str())?;
            let end = parse_hex(caps.get(3)?.as_str())?;
            let (second, tags_idx) = if v3 {
                let second = match (caps.get(4), caps.get(5)) {
                    (Some(s2), Some(e2)) => {
                        Some((parse_hex(s2.as_str())?, parse_hex(e2.as_str())?))
                    }
                    _ => None,
                };
                (second, 6)
            } else {
                (None, 4)
            };
            let tags = caps
                .get(tags_idx)?
                .as_str()
                .split(',')
                .filter_map(chop_tag)
                .collect();
            Some(PlaceStmt {
                label,
                start,
                end,
                second,
                tags,
            })
        })
    }

    /// Match one line against the block content header statement.
    pub(crate) fn content_header(&self, line: &str) -> Option<ContentHeader> {
        let caps = self.header.captures(line)?;
        let label = caps.get(1)?.as_str().to_string();
        let part = match self.version {
            GrammarVersion::V1 => None,
            _ => match (caps.get(2), caps.get(3)) {
                (Some(n), Some(m)) => Some((n.as_str().parse().ok()?, m.as_str().parse().ok()?)),
                _ => None,
            },
        };
        Some(ContentHeader { label, part })
    }

    /// Match one line against the closing `- <end-address> <size>` statement.
    pub(crate) fn content_end(&self, line: &str) -> Option<ContentEnd> {
        let caps = self.end.captures(line)?;
        let end = parse_hex(caps.get(1)?.as_str())?;
        Some(ContentEnd { end })
    }

    /// Match one body line against the object-line statement.
    ///
    /// Returns `None` both for a regex non-match and for an unusable hex field;
    /// the caller decides whether that is noise to log or a blank line to ignore.
    pub(crate) fn object_line<'t>(&self, line: &'t str) -> Option<ObjectLine<'t>> {
        let caps = self.object.captures(line)?;
        let (kind_mod, kind, addr_idx) = match self.version {
            GrammarVersion::V1 => (None, caps.get(2).map(|m| m.as_str()), 3),
            _ => (
                caps.get(2).and_then(|m| KindModifier::from_word(m.as_str())),
                caps.get(3).map(|m| m.as_str()),
                4,
            ),
        };
        Some(ObjectLine {
            section: caps.get(1)?.as_str().trim(),
            kind_mod,
            kind,
            addr: parse_hex(caps.get(addr_idx)?.as_str())?,
            size: parse_hex(caps.get(addr_idx + 1)?.as_str())?,
            descriptor: caps.get(addr_idx + 2)?.as_str().trim(),
            module_ref: caps
                .get(addr_idx + 3)
                .and_then(|m| m.as_str().parse().ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACE_V2_TEXT: &str = r#""P2":  place in [from 0x20000000 to 0x20007fff] {
          rw, block CSTACK, block HEAP, section .noinit };"#;

    const PLACE_V3_TEXT: &str = r#""P1":  place in [from 0x0800_0000 to 0x0800_ffff] | [from 0x0810_0000 to 0x0810_7fff] { ro, code };"#;

    #[test]
    fn place_statement_extracts_tags() {
        let grammar = Grammar::get(GrammarVersion::V2);
        let stmts: Vec<_> = grammar.place_statements(PLACE_V2_TEXT).collect();
        assert_eq!(stmts.len(), 1);
        let stmt = &stmts[0];
        assert_eq!(stmt.label, "P2");
        assert_eq!(stmt.start, 0x2000_0000);
        assert_eq!(stmt.end, 0x2000_7fff);
        assert!(stmt.second.is_none());
        assert_eq!(stmt.tags, vec!["rw", "CSTACK", "HEAP", ".noinit"]);
    }

    #[test]
    fn v3_place_statement_carries_second_range() {
        let grammar = Grammar::get(GrammarVersion::V3);
        let stmts: Vec<_> = grammar.place_statements(PLACE_V3_TEXT).collect();
        assert_eq!(stmts.len(), 1);
        let stmt = &stmts[0];
        assert_eq!(stmt.start, 0x0800_0000);
        assert_eq!(stmt.end, 0x0800_ffff);
        assert_eq!(stmt.second, Some((0x0810_0000, 0x0810_7fff)));
        assert_eq!(stmt.tags, vec!["ro", "code"]);
    }

    #[test]
    fn object_line_with_modifier_and_module_ref() {
        let grammar = Grammar::get(GrammarVersion::V2);
        let line =
            " .text                ro code  0x000040a0   0x288c  SensorFusionMobile.cpp.obj [6]";
        let obj = grammar.object_line(line).unwrap();
        assert_eq!(obj.section, ".text");
        assert_eq!(obj.kind_mod, Some(KindModifier::Ro));
        assert_eq!(obj.kind, Some("code"));
        assert_eq!(obj.addr, 0x40a0);
        assert_eq!(obj.size, 0x288c);
        assert_eq!(obj.descriptor, "SensorFusionMobile.cpp.obj");
        assert_eq!(obj.module_ref, Some(6));
    }

    #[test]
    fn object_line_without_modifier() {
        let grammar = Grammar::get(GrammarVersion::V1);
        let line = " .rodata              const  0x00008000    0x400  lookup_tables.c.o";
        let obj = grammar.object_line(line).unwrap();
        assert_eq!(obj.section, ".rodata");
        assert_eq!(obj.kind_mod, None);
        assert_eq!(obj.kind, Some("const"));
        assert_eq!(obj.module_ref, None);
        assert_eq!(obj.descriptor, "lookup_tables.c.o");
    }

    #[test]
    fn noise_line_does_not_match() {
        let grammar = Grammar::get(GrammarVersion::V2);
        assert!(grammar.object_line("  *** linker generated ***").is_none());
        assert!(grammar.object_line("").is_none());
    }

    #[test]
    fn content_header_accepts_part_annotation() {
        let grammar = Grammar::get(GrammarVersion::V2);
        let plain = grammar.content_header("\"P1\":        0x2ce6b").unwrap();
        assert_eq!(plain.label, "P1");
        assert_eq!(plain.part, None);

        let part = grammar
            .content_header("\"P1\", part 2 of 3:        0x1a00")
            .unwrap();
        assert_eq!(part.label, "P1");
        assert_eq!(part.part, Some((2, 3)));
    }

    #[test]
    fn content_end_terminates_listing() {
        let grammar = Grammar::get(GrammarVersion::V2);
        let end = grammar
            .content_end("                             - 0x20007588   0x7588")
            .unwrap();
        assert_eq!(end.end, 0x2000_7588);
    }

    #[test]
    fn detect_picks_v3_for_split_ranges() {
        assert_eq!(Grammar::detect(PLACE_V3_TEXT).version(), GrammarVersion::V3);
        assert_eq!(
            Grammar::detect("start 0x0800_0000 end").version(),
            GrammarVersion::V3
        );
    }

    #[test]
    fn detect_picks_v2_for_modifier_column() {
        let text =
            " .text                ro code  0x000040a0   0x288c  SensorFusionMobile.cpp.obj [6]";
        assert_eq!(Grammar::detect(text).version(), GrammarVersion::V2);
        assert_eq!(
            Grammar::detect("\"P1\", part 1 of 2:   0x100").version(),
            GrammarVersion::V2
        );
    }

    #[test]
    fn detect_falls_back_to_v1_for_bare_object_lines() {
        let text = " .rodata              const  0x00008000    0x400  lookup_tables.c.o";
        assert_eq!(Grammar::detect(text).version(), GrammarVersion::V1);
    }

    #[test]
    fn detect_defaults_to_v2() {
        assert_eq!(Grammar::detect("").version(), GrammarVersion::V2);
    }

    #[test]
    fn grouped_hex_parses() {
        assert_eq!(parse_hex("0800_ffff"), Some(0x0800_ffff));
        assert_eq!(parse_hex("40a0"), Some(0x40a0));
        assert_eq!(parse_hex("xyz"), None);
    }
}
