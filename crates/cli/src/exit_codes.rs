//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args, missing file)           |
//! | 3    | Unresolved differences remain (declined/skipped)   |
//! | 4    | A definition file failed to parse or validate      |
//! | 5    | Store error (open, write, or commit failure)       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Reconciliation left divergences in place: declined proposals or skipped
/// clusters/definitions. Like `diff(1)`, nonzero means "not in sync."
pub const EXIT_UNRESOLVED: u8 = 3;

/// A definition file failed to parse or validate.
pub const EXIT_INVALID_DEFINITION: u8 = 4;

/// The settings store could not be opened, written, or committed.
pub const EXIT_STORE: u8 = 5;
