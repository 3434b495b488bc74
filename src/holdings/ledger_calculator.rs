use rust_decimal::Decimal;

use crate::constants::DECIMAL_PRECISION;

use super::holdings_errors::{LedgerError, Result};
use super::holdings_model::{LedgerTotals, Transaction};

/// Recomputes a holding's aggregates from its full transaction history.
///
/// Weighted-average cost accounting: acquisitions add `quantity * price` to
/// the cost basis, disposals shrink the position without moving the average.
/// The input must already be ordered the way the ledger orders it (tx_date,
/// then insertion order); the running prefix sum enforces the oversell guard,
/// so any history that dips below zero at some point in time is rejected as a
/// whole. Pure function of its input, safe to re-run after every mutation.
pub fn reconcile(transactions: &[Transaction]) -> Result<LedgerTotals> {
    let mut running_quantity = Decimal::ZERO;
    let mut acquired_quantity = Decimal::ZERO;
    let mut acquired_cost = Decimal::ZERO;

    for transaction in transactions {
        let before = running_quantity;
        running_quantity += transaction.quantity;

        if running_quantity < Decimal::ZERO {
            return Err(LedgerError::InsufficientBalance {
                available: before,
                requested: transaction.quantity.abs(),
            });
        }

        if transaction.quantity > Decimal::ZERO {
            acquired_quantity += transaction.quantity;
            acquired_cost += transaction.quantity * transaction.price;
        }
    }

    let total_cost = acquired_cost.round_dp(DECIMAL_PRECISION);
    let average_price = if acquired_quantity > Decimal::ZERO {
        (acquired_cost / acquired_quantity).round_dp(DECIMAL_PRECISION)
    } else {
        Decimal::ZERO
    };

    Ok(LedgerTotals {
        total_quantity: running_quantity,
        total_cost,
        average_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::holdings_model::Wallet;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(day: u32, quantity: Decimal, price: Decimal) -> Transaction {
        let stamp = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Transaction {
            id: format!("tx-{}-{}", day, quantity),
            holding_id: "h1".to_string(),
            quantity,
            price,
            tx_date: stamp,
            wallet: Wallet::Exchange,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn empty_history_yields_zero_totals() {
        let totals = reconcile(&[]).unwrap();
        assert_eq!(totals.total_quantity, Decimal::ZERO);
        assert_eq!(totals.total_cost, Decimal::ZERO);
        assert_eq!(totals.average_price, Decimal::ZERO);
    }

    #[test]
    fn acquisitions_accumulate_weighted_average() {
        let history = vec![tx(1, dec!(10), dec!(2)), tx(2, dec!(10), dec!(4))];
        let totals = reconcile(&history).unwrap();
        assert_eq!(totals.total_quantity, dec!(20));
        assert_eq!(totals.total_cost, dec!(60));
        assert_eq!(totals.average_price, dec!(3));
    }

    #[test]
    fn disposal_leaves_average_price_unchanged() {
        let history = vec![
            tx(1, dec!(10), dec!(2)),
            tx(2, dec!(10), dec!(4)),
            tx(3, dec!(-5), dec!(10)),
        ];
        let totals = reconcile(&history).unwrap();
        assert_eq!(totals.total_quantity, dec!(15));
        assert_eq!(totals.average_price, dec!(3));
        assert_eq!(totals.total_cost, dec!(60));
    }

    #[test]
    fn oversell_in_the_middle_of_history_is_rejected() {
        let history = vec![
            tx(1, dec!(5), dec!(2)),
            tx(2, dec!(-6), dec!(3)),
            tx(3, dec!(10), dec!(1)),
        ];
        let err = reconcile(&history).unwrap_err();
        match err {
            LedgerError::InsufficientBalance {
                available,
                requested,
            } => {
                assert_eq!(available, dec!(5));
                assert_eq!(requested, dec!(6));
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn selling_entire_position_is_allowed() {
        let history = vec![tx(1, dec!(3), dec!(100)), tx(2, dec!(-3), dec!(120))];
        let totals = reconcile(&history).unwrap();
        assert_eq!(totals.total_quantity, Decimal::ZERO);
        // Average acquisition price survives a full exit
        assert_eq!(totals.average_price, dec!(100));
    }

    #[test]
    fn zero_price_airdrop_dilutes_the_average() {
        let history = vec![tx(1, dec!(10), dec!(4)), tx(2, dec!(10), dec!(0))];
        let totals = reconcile(&history).unwrap();
        assert_eq!(totals.total_quantity, dec!(20));
        assert_eq!(totals.total_cost, dec!(40));
        assert_eq!(totals.average_price, dec!(2));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let history = vec![
            tx(1, dec!(1.5), dec!(30000)),
            tx(2, dec!(-0.5), dec!(35000)),
            tx(3, dec!(2), dec!(28000)),
        ];
        let first = reconcile(&history).unwrap();
        let second = reconcile(&history).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fractional_quantities_are_exact() {
        let history = vec![tx(1, dec!(0.1), dec!(300)), tx(2, dec!(0.2), dec!(600))];
        let totals = reconcile(&history).unwrap();
        assert_eq!(totals.total_quantity, dec!(0.3));
        assert_eq!(totals.total_cost, dec!(150));
        assert_eq!(totals.average_price, dec!(500));
    }
}
