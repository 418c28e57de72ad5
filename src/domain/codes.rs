use chrono::{Datelike, NaiveDate};

/// Kinds of human-readable sequential codes. Each kind has its own prefix and
/// its own per-day sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Booking,
    Customer,
    Invoice,
    Payment,
}

impl CodeKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CodeKind::Booking => "BK",
            CodeKind::Customer => "CUS",
            CodeKind::Invoice => "INV",
            CodeKind::Payment => "PAY",
        }
    }

    /// `BK240507` for a booking issued on 2024-05-07.
    pub fn day_prefix(&self, date: NaiveDate) -> String {
        format!(
            "{}{:02}{:02}{:02}",
            self.prefix(),
            date.year().rem_euclid(100),
            date.month(),
            date.day()
        )
    }

    /// Code for the `issued_today + 1`-th code of the day.
    pub fn format(&self, date: NaiveDate, issued_today: u64) -> String {
        format!("{}{:04}", self.day_prefix(date), issued_today + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_second_booking_of_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(CodeKind::Booking.format(day, 0), "BK2405070001");
        assert_eq!(CodeKind::Booking.format(day, 1), "BK2405070002");
    }

    #[test]
    fn prefixes_are_distinct_per_kind() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(CodeKind::Invoice.format(day, 41), "INV2601020042");
        assert_eq!(CodeKind::Payment.day_prefix(day), "PAY260102");
        assert_eq!(CodeKind::Customer.day_prefix(day), "CUS260102");
    }
}
