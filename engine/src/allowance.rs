//! Allowance scheduling.
//!
//! Payment occurrences are computed from the schedule anchor
//! (`created_at`) rather than from the last payment, so irregular
//! catch-ups never make the schedule drift.

use crate::model::{Allowance, AllowanceFrequency};
use crate::Timestamp;
use chrono::{Duration, Months};

/// Upper bound on catch-up payments applied in one pass, so a device
/// that was offline for a year does not flood the ledger.
pub const MAX_CATCHUP_PAYMENTS: usize = 12;

// Occurrences are only searched this far from the anchor.
const SCHEDULE_HORIZON: u32 = 52;

/// A payment that is due but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DueAllowance {
    pub date: Timestamp,
    pub amount: f64,
}

fn occurrence(allowance: &Allowance, n: u32) -> Option<Timestamp> {
    match allowance.frequency {
        AllowanceFrequency::Weekly => Some(allowance.created_at + Duration::weeks(n as i64)),
        AllowanceFrequency::Monthly => allowance.created_at.checked_add_months(Months::new(n)),
    }
}

/// Payments due at `now` that have not been applied yet, oldest first,
/// capped at [`MAX_CATCHUP_PAYMENTS`].
pub fn due_allowances(allowance: &Allowance, now: Timestamp) -> Vec<DueAllowance> {
    if !allowance.is_active {
        return Vec::new();
    }

    let last_paid = allowance.last_paid_date.unwrap_or(allowance.created_at);
    let mut dues = Vec::new();

    for n in 1..=SCHEDULE_HORIZON {
        let Some(next) = occurrence(allowance, n) else {
            break;
        };
        if next > now {
            break;
        }
        if last_paid < next {
            dues.push(DueAllowance {
                date: next,
                amount: allowance.amount,
            });
        }
    }

    dues.truncate(MAX_CATCHUP_PAYMENTS);
    dues
}

/// The next scheduled payment strictly after `now`, if the schedule
/// is active and within the horizon.
pub fn next_due_date(allowance: &Allowance, now: Timestamp) -> Option<Timestamp> {
    if !allowance.is_active {
        return None;
    }
    (1..=SCHEDULE_HORIZON)
        .filter_map(|n| occurrence(allowance, n))
        .find(|next| *next > now)
}
