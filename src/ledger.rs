//! Balance arithmetic for the allowance ledger.
//!
//! A ledger entry carries the raw signed delta; the balance update clamps at
//! zero. The two deliberately disagree when a deduction overshoots: the
//! ledger records what the parent asked for, the balance records what was
//! actually left.

use crate::entities::time_entries::EntryKind;

/// Convert a caller-supplied magnitude into the signed delta stored in the
/// ledger. Deductions are negative, everything else is positive.
#[must_use]
pub const fn signed_delta(kind: EntryKind, magnitude: i32) -> i32 {
    match kind {
        EntryKind::Deduction => -magnitude.abs(),
        EntryKind::Addition | EntryKind::Reset => magnitude.abs(),
    }
}

/// Apply a signed delta to a balance, flooring at zero. Additions are not
/// capped above the daily allowance.
#[must_use]
pub const fn apply_delta(balance: i32, delta: i32) -> i32 {
    let next = balance + delta;
    if next < 0 { 0 } else { next }
}
