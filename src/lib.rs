// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # mapscope
//!
//! Parses the linker map files of the IAR embedded toolchain into structured
//! memory-placement tables and aggregates them into size-usage reports.
//!
//! A map file describes how the linker placed every object into the target's
//! memory blocks. `mapscope` extracts:
//!
//! - the named **blocks** (memory regions) with their address ranges, declared
//!   sizes, and semantic tags (`CSTACK`, `HEAP`, ...),
//! - the **placed objects** within each block with size, kind, and originating
//!   module, plus one synthetic `unused` row per block for the remainder of its
//!   declared size,
//! - a **module table** resolving the bracketed integer references the listing
//!   uses back to object-file names.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapscope::prelude::*;
//! use std::path::Path;
//!
//! let map = MapFile::from_file(Path::new("FSP312.map"), None)?;
//! for (label, block) in &map.placement.blocks {
//!     println!("{label}: {} bytes declared", block.size);
//! }
//!
//! let report = map.report();
//! println!("ro {} / rw {} / total {}", report.ro.total, report.rw.total, report.total);
//! # Ok::<(), mapscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Data flows strictly left to right, in one synchronous pass:
//!
//! raw text → [`sections`] → ([`modules`], placement text) → [`placement`] →
//! [`report`]
//!
//! - [`sections`] - splits the raw text at the banner headings
//! - [`modules`] - the module-ID table from `MODULE SUMMARY`
//! - [`placement`] - the core parser for `PLACEMENT SUMMARY`, with the three
//!   grammar generations behind [`placement::grammar::Grammar`]
//! - [`report`] - per-module/per-block size aggregation
//! - [`color`] - deterministic color assignment for chart rendering
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). A single malformed
//! listing line is logged (via the `log` facade) and skipped; a missing
//! required section, a duplicate placement address, or a kind-modifier
//! mismatch aborts the parse — those indicate either malformed input or
//! grammar drift and must not be masked.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// Top-level section splitting.
pub mod sections;

/// Module-ID table extraction.
pub mod modules;

/// Block geometry, object listings, and the versioned grammars.
pub mod placement;

/// Size aggregation into reports.
pub mod report;

/// Deterministic chart color assignment.
pub mod color;

/// The map-file parse session tying the pipeline together.
pub mod mapfile;

/// `mapscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`], used consistently for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `mapscope` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Main entry point for parsing a map file. See [`mapfile::MapFile`].
pub use mapfile::MapFile;
