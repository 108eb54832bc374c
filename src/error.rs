use thiserror::Error;

use crate::placement::KindModifier;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The taxonomy follows the parse pipeline: structural failures (a required map-file section
/// is missing entirely), consistency failures (duplicate placement addresses, kind-modifier
/// drift between a block and its listing lines), and plain I/O. Per-line grammar failures are
/// *not* represented here — a single malformed listing line is logged and skipped, never
/// escalated, since real map files contain occasional noise lines.
///
/// # Examples
///
/// ```rust,no_run
/// use mapscope::{Error, MapFile};
/// use std::path::Path;
///
/// match MapFile::from_file(Path::new("firmware.map"), None) {
///     Ok(map) => println!("parsed {} blocks", map.placement.blocks.len()),
///     Err(Error::MissingSection(name)) => eprintln!("no '{name}' section"),
///     Err(Error::DuplicateAddress { address, block }) => {
///         eprintln!("address {address:#010x} double counted in block {block}");
///     }
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A required top-level map-file section is absent.
    ///
    /// Raised when a downstream parser asks for a section (e.g. `PLACEMENT SUMMARY`)
    /// that the section splitter never saw. Fatal: without the section there is
    /// nothing to report on.
    #[error("required section '{0}' not present in map file")]
    MissingSection(String),

    /// Two placement lines resolved to the same address within one parse.
    ///
    /// Either the input genuinely describes overlapping placement or the object-line
    /// grammar matched something it should not have. Both must surface instead of
    /// silently merging rows.
    #[error("object address double counted: {address:#010x} (block \"{block}\")")]
    DuplicateAddress {
        /// The address that appeared twice
        address: u64,
        /// The block whose listing produced the second occurrence
        block: String,
    },

    /// A listing line carries a read-only/read-write modifier that contradicts its block.
    ///
    /// The code block is always read-only and every other block read-write; a line
    /// disagreeing with that signals grammar drift and is never accepted.
    #[error("kind modifier mismatch in block \"{block}\": expected {expected}, line carries {found}")]
    KindModifierMismatch {
        /// The block whose listing contained the offending line
        block: String,
        /// The modifier implied by the block's identity
        expected: KindModifier,
        /// The modifier the line actually carried
        found: KindModifier,
    },

    /// The input is damaged in a way the parser cannot recover from.
    ///
    /// Includes the source location where the malformation was detected, via the
    /// `malformed_error!` macro.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors raised while reading the map file from disk.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
