//! CLI Exit Code Registry
//!
//! Single source of truth for `fuzzylink` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (output could not be written)          |
//! | 2    | Usage error (bad arguments; emitted by clap)         |
//! | 3    | Configuration error (bad job file or match options)  |
//! | 4    | Input error (unreadable or malformed table)          |
//! | 5    | Interrupted by the operator during review            |

use fuzzylink_linkage::LinkError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap also exits with this code.
pub const EXIT_USAGE: u8 = 2;

/// Job file or match options rejected before any row was compared.
pub const EXIT_CONFIG: u8 = 3;

/// An input table could not be read or is malformed.
pub const EXIT_INPUT: u8 = 4;

/// The operator aborted an interactive review. No output is written.
pub const EXIT_INTERRUPTED: u8 = 5;

/// Map an engine error to its exit code.
pub fn link_exit_code(err: &LinkError) -> u8 {
    match err {
        LinkError::Configuration(_) => EXIT_CONFIG,
        LinkError::Interrupted { .. } => EXIT_INTERRUPTED,
        LinkError::Table(_) | LinkError::Io(_) => EXIT_INPUT,
    }
}
