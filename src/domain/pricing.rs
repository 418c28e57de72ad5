use chrono::NaiveDate;
use thiserror::Error;

/// Money arithmetic left the range of `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount is out of range")]
pub struct AmountOverflow;

/// Nights between two calendar dates. Dates carry no time of day, so the
/// difference is already a whole number of days.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

pub fn stay_total(base_price: i64, nights: i64) -> Result<i64, AmountOverflow> {
    base_price.checked_mul(nights).ok_or(AmountOverflow)
}

/// `amount * percent / 100`, rounded half up.
pub fn percent_of(amount: i64, percent: i64) -> Result<i64, AmountOverflow> {
    amount
        .checked_mul(percent)
        .and_then(|scaled| scaled.checked_add(50))
        .map(|scaled| scaled.div_euclid(100))
        .ok_or(AmountOverflow)
}

/// Sum of line totals or payments.
pub fn checked_sum(amounts: impl IntoIterator<Item = i64>) -> Result<i64, AmountOverflow> {
    amounts
        .into_iter()
        .try_fold(0i64, |acc, amount| acc.checked_add(amount))
        .ok_or(AmountOverflow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: i64,
    pub tax_amount: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

impl InvoiceTotals {
    pub fn compute(
        subtotal: i64,
        discount_amount: i64,
        vat_percent: i64,
    ) -> Result<Self, AmountOverflow> {
        let tax_amount = percent_of(subtotal, vat_percent)?;
        let total_amount = subtotal
            .checked_add(tax_amount)
            .and_then(|gross| gross.checked_sub(discount_amount))
            .ok_or(AmountOverflow)?;
        Ok(Self {
            subtotal,
            tax_amount,
            discount_amount,
            total_amount: total_amount.max(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn nights_and_total() {
        assert_eq!(nights(d(2024, 5, 7), d(2024, 5, 10)), 3);
        assert_eq!(nights(d(2024, 12, 31), d(2025, 1, 1)), 1);
        assert_eq!(stay_total(1_000_000, 3), Ok(3_000_000));
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(3_000_000, 30), Ok(900_000));
        assert_eq!(percent_of(3_000_000, 100), Ok(3_000_000));
        assert_eq!(percent_of(5, 30), Ok(2));
        assert_eq!(percent_of(15, 10), Ok(2));
        assert_eq!(percent_of(0, 30), Ok(0));
    }

    #[test]
    fn checkout_invoice_totals() {
        let totals = InvoiceTotals::compute(3_000_000, 0, 10).unwrap();
        assert_eq!(totals.tax_amount, 300_000);
        assert_eq!(totals.total_amount, 3_300_000);

        let discounted = InvoiceTotals::compute(1_000_000, 100_000, 10).unwrap();
        assert_eq!(discounted.total_amount, 1_000_000);
    }

    #[test]
    fn huge_amounts_are_rejected_instead_of_wrapping() {
        assert_eq!(stay_total(i64::MAX / 2, 3), Err(AmountOverflow));
        assert_eq!(percent_of(i64::MAX / 2, 30), Err(AmountOverflow));
        assert_eq!(
            InvoiceTotals::compute(1_000_000_000_000_000_000, 0, 10),
            Err(AmountOverflow)
        );
        assert_eq!(
            InvoiceTotals::compute(i64::MAX - 1_000, 0, 0).map(|t| t.total_amount),
            Ok(i64::MAX - 1_000)
        );
        // The tax fits but subtotal + tax does not.
        assert_eq!(InvoiceTotals::compute(i64::MAX - 1_000, 0, 1), Err(AmountOverflow));
        assert_eq!(checked_sum([i64::MAX, 1]), Err(AmountOverflow));
        assert_eq!(checked_sum([400_000, 600_000]), Ok(1_000_000));
    }
}
