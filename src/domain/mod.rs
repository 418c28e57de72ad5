//! Storage-free rules of the booking lifecycle: status enums and their
//! transition table, stay pricing and code formatting.

pub mod codes;
pub mod pricing;
pub mod status;

pub use codes::CodeKind;
pub use pricing::{AmountOverflow, InvoiceTotals, checked_sum, nights, percent_of, stay_total};
pub use status::{
    BookingPaymentStatus, BookingStatus, InvoiceStatus, PaymentMethod, RoomStatus, UnknownStatus,
};

use chrono::NaiveDate;

/// Date rules for a requested stay: check-out strictly after check-in and,
/// when `today` is given, check-in not before today.
pub fn validate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: Option<NaiveDate>,
) -> Result<(), String> {
    if check_out <= check_in {
        return Err("check_out_date must be after check_in_date".into());
    }
    if let Some(today) = today {
        if check_in < today {
            return Err("check_in_date cannot be in the past".into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stay_date_rules() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        let yesterday = today.pred_opt().unwrap();

        assert!(validate_stay(today, tomorrow, Some(today)).is_ok());
        assert!(validate_stay(today, today, Some(today)).is_err());
        assert!(validate_stay(tomorrow, today, None).is_err());
        assert!(validate_stay(yesterday, tomorrow, Some(today)).is_err());
        assert!(validate_stay(yesterday, tomorrow, None).is_ok());
    }
}
