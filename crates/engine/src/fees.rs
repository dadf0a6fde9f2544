//! Fee schedules applied when an operation is requested.
//!
//! Fees are computed once, when the pending record is created, and stored on
//! the record. Settlement only replays the stored amounts.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Split of a consumption between the platform fee and the developer share.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumptionFee {
    pub fee_amount: i64,
    pub developer_amount: i64,
}

/// Split of a transfer between the burned fee and what the receiver gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferFee {
    pub fee_amount: i64,
    pub actual_amount: i64,
}

/// Computes fees for the ledger.
///
/// Implementations must be pure: the same amount always yields the same split,
/// and `fee_amount` is never negative nor larger than the amount.
pub trait FeePolicy: Debug + Send + Sync {
    fn consumption(&self, amount: i64) -> ConsumptionFee;
    fn transfer(&self, amount: i64) -> TransferFee;
}

/// Flat-rate schedule expressed in basis points.
///
/// - consumption: `floor(amount * consumption_bps / 10_000)`
/// - transfer: `floor(amount * transfer_bps / 10_000)` when
///   `amount > transfer_free_up_to`, otherwise free
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardFees {
    pub consumption_bps: i64,
    pub transfer_bps: i64,
    pub transfer_free_up_to: i64,
}

impl Default for StandardFees {
    fn default() -> Self {
        Self {
            consumption_bps: 300,
            transfer_bps: 700,
            transfer_free_up_to: 1000,
        }
    }
}

/// Truncating `amount * bps / 10_000`, clamped to `0..=amount`.
fn portion(amount: i64, bps: i64) -> i64 {
    if amount <= 0 || bps <= 0 {
        return 0;
    }
    let fee = i128::from(amount) * i128::from(bps) / 10_000;
    i64::try_from(fee).map_or(amount, |fee| fee.min(amount))
}

impl FeePolicy for StandardFees {
    fn consumption(&self, amount: i64) -> ConsumptionFee {
        let fee_amount = portion(amount, self.consumption_bps);
        ConsumptionFee {
            fee_amount,
            developer_amount: amount - fee_amount,
        }
    }

    fn transfer(&self, amount: i64) -> TransferFee {
        let fee_amount = if amount > self.transfer_free_up_to {
            portion(amount, self.transfer_bps)
        } else {
            0
        };
        TransferFee {
            fee_amount,
            actual_amount: amount - fee_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumption_fee_is_truncated_three_percent() {
        let fees = StandardFees::default();
        assert_eq!(
            fees.consumption(100),
            ConsumptionFee {
                fee_amount: 3,
                developer_amount: 97
            }
        );
        // 33 * 0.03 = 0.99 -> 0
        assert_eq!(fees.consumption(33).fee_amount, 0);
        // 67 * 0.03 = 2.01 -> 2
        assert_eq!(fees.consumption(67).fee_amount, 2);
        assert_eq!(fees.consumption(1).developer_amount, 1);
    }

    #[test]
    fn consumption_split_sums_to_amount() {
        let fees = StandardFees::default();
        for amount in [1, 7, 99, 100, 101, 1234, 99_999, i64::MAX / 2] {
            let split = fees.consumption(amount);
            assert_eq!(split.fee_amount + split.developer_amount, amount);
            assert_eq!(
                i128::from(split.fee_amount),
                i128::from(amount) * 3 / 100,
                "amount {amount}"
            );
        }
    }

    #[test]
    fn transfer_is_free_up_to_threshold() {
        let fees = StandardFees::default();
        for amount in [1, 50, 999, 1000] {
            let split = fees.transfer(amount);
            assert_eq!(split.fee_amount, 0);
            assert_eq!(split.actual_amount, amount);
        }
    }

    #[test]
    fn transfer_above_threshold_pays_seven_percent() {
        let fees = StandardFees::default();
        // 1001 * 0.07 = 70.07 -> 70
        assert_eq!(
            fees.transfer(1001),
            TransferFee {
                fee_amount: 70,
                actual_amount: 931
            }
        );
        // 1500 * 0.07 = 105
        assert_eq!(fees.transfer(1500).fee_amount, 105);
        // 1014 * 0.07 = 70.98 -> 70
        assert_eq!(fees.transfer(1014).fee_amount, 70);
    }

    #[test]
    fn custom_rates_are_honored() {
        let fees = StandardFees {
            consumption_bps: 1000,
            transfer_bps: 5000,
            transfer_free_up_to: 0,
        };
        assert_eq!(fees.consumption(55).fee_amount, 5);
        assert_eq!(fees.transfer(3).fee_amount, 1);
        assert_eq!(fees.transfer(3).actual_amount, 2);
    }

    #[test]
    fn non_positive_amounts_pay_nothing() {
        let fees = StandardFees::default();
        assert_eq!(fees.consumption(0).fee_amount, 0);
        assert_eq!(fees.transfer(-5).fee_amount, 0);
    }
}
