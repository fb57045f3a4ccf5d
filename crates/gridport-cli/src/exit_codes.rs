//! CLI exit code registry.
//!
//! Exit codes are part of the shell contract; scripts key off them, so they
//! only ever grow, never change meaning.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | Remote service or transport failure                 |
//! | 2    | Usage or validation error (bad args, bad input)     |
//! | 3    | Not found (sheet or key column)                     |
//! | 4    | Multiplicity conflict (key matched more than 1 row) |

use gridport_engine::ErrorKind;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_REMOTE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_MULTIPLICITY: u8 = 4;

pub fn for_kind(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Validation => EXIT_USAGE,
        ErrorKind::NotFound => EXIT_NOT_FOUND,
        ErrorKind::Multiplicity => EXIT_MULTIPLICITY,
        ErrorKind::Remote => EXIT_REMOTE,
    }
}
