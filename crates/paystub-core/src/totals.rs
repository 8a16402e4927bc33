use crate::constants::{MILE_RATE, MILEAGE_CATEGORY};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which category earns mileage and at what rate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MileagePolicy {
    pub category: Category,
    /// Dollars per mile
    pub rate: f64,
}

impl Default for MileagePolicy {
    fn default() -> Self {
        Self {
            category: MILEAGE_CATEGORY,
            rate: MILE_RATE,
        }
    }
}

impl MileagePolicy {
    pub fn applies_to(&self, category: Category) -> bool {
        category == self.category
    }

    /// Mileage owed for a single item; zero outside the eligible category
    pub fn reimbursement(&self, item: &LineItem) -> f64 {
        if self.applies_to(item.category) {
            item.miles_or_zero() * self.rate
        } else {
            0.0
        }
    }
}

/// Compute totals under the default mileage policy
pub fn compute_totals<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Totals {
    compute_totals_with(items, &MileagePolicy::default())
}

/// Compute earnings, mileage and net pay for `items`.
///
/// Blank numbers count as zero. Nothing is rounded here.
pub fn compute_totals_with<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
    policy: &MileagePolicy,
) -> Totals {
    let (earnings, mileage) = items
        .into_iter()
        .fold((0.0, 0.0), |(earnings, mileage), item| {
            (earnings + item.amount(), mileage + policy.reimbursement(item))
        });

    Totals {
        earnings,
        mileage,
        net: earnings + mileage,
    }
}
