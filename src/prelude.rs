//! Convenient re-exports of the most commonly used types.
//!
//! # Example
//!
//! ```rust,no_run
//! use mapscope::prelude::*;
//!
//! let map = MapFile::from_file("FSP312.map".as_ref(), None)?;
//! let report = map.report();
//! println!("{} bytes placed", report.total);
//! # Ok::<(), mapscope::Error>(())
//! ```

pub use crate::color::{ColorAllocator, Rgb};
pub use crate::mapfile::MapFile;
pub use crate::modules::ModuleTable;
pub use crate::placement::grammar::{Grammar, GrammarVersion};
pub use crate::placement::{Block, KindModifier, ObjectKind, PlacedObject, PlacementSummary};
pub use crate::report::{PartitionReport, SizeReport};
pub use crate::sections::Sections;
pub use crate::{Error, Result};
