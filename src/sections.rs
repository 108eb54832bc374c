//! Top-level section splitting for ilink map files.
//!
//! An ilink map file is divided into named sections, each introduced by a three-line
//! banner: a 79-star rule, a `*** <TITLE>` line, and a `***` closer. [`Sections`]
//! splits the raw text into exact spans between consecutive banners so the
//! downstream parsers never have to worry about each other's text.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

// Matches the banner heading, capturing the section title:
// *******************************************************************************
// *** PLACEMENT SUMMARY
// ***
static BANNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*{79}\r?\n\*{3}\s(.*?)\r?\n\*{3}.*\r?\n?").unwrap()
});

/// The named top-level sections of one map file.
///
/// Produced once per read and immutable afterwards. Section text spans from the
/// end of its banner to the start of the next banner, or to end of input for
/// the last section. A file with no banners yields an empty table; consumers
/// that require a section get [`crate::Error::MissingSection`] from [`Sections::require`].
#[derive(Debug, Clone)]
pub struct Sections {
    spans: BTreeMap<String, String>,
}

impl Sections {
    /// Split the full map-file text into its named sections.
    pub fn parse(text: &str) -> Sections {
        let mut spans = BTreeMap::new();

        let banners: Vec<(String, usize, usize)> = BANNER
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                let title = caps.get(1).unwrap().as_str().trim_end().to_string();
                (title, whole.start(), whole.end())
            })
            .collect();

        for (i, (title, _, body_start)) in banners.iter().enumerate() {
            let body_end = banners
                .get(i + 1)
                .map(|(_, next_start, _)| *next_start)
                .unwrap_or(text.len());
            // A repeated title keeps the later span, matching how the original
            // tool's section map behaved.
            spans.insert(title.clone(), text[*body_start..body_end].to_string());
        }

        log::debug!("loaded sections: {:?}", spans.keys().collect::<Vec<_>>());
        Sections { spans }
    }

    /// Look up a section body by title.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.spans.get(name).map(String::as_str)
    }

    /// Look up a section body, failing with [`crate::Error::MissingSection`] when absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingSection`] if no section with that title was found.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| crate::Error::MissingSection(name.to_string()))
    }

    /// Iterate over the section titles in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spans.keys().map(String::as_str)
    }

    /// Number of sections found.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// `true` when the input contained no banner headings at all.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
