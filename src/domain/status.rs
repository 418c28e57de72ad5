use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a closed status enum
/// stored as text.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

text_enum!(BookingStatus, "booking status", {
    Pending => "pending",
    Confirmed => "confirmed",
    CheckedIn => "checked_in",
    CheckedOut => "checked_out",
    Cancelled => "cancelled",
});

impl BookingStatus {
    /// Statuses that hold the room for their date range.
    pub const OCCUPYING: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::CheckedIn];

    pub fn occupies_room(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }

    /// Room, dates, occupants and amounts may only change before arrival.
    pub fn is_editable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_cancellable(&self) -> bool {
        !matches!(self, BookingStatus::CheckedIn | BookingStatus::CheckedOut)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
    Cleaning,
    Maintenance,
    OutOfOrder,
}

text_enum!(RoomStatus, "room status", {
    Available => "available",
    Occupied => "occupied",
    Cleaning => "cleaning",
    Maintenance => "maintenance",
    OutOfOrder => "out_of_order",
});

/// Side-channel flag written by payment notifications; independent of
/// [`BookingStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    Unpaid,
    DepositPaid,
    Paid,
    Failed,
}

text_enum!(BookingPaymentStatus, "booking payment status", {
    Unpaid => "unpaid",
    DepositPaid => "deposit_paid",
    Paid => "paid",
    Failed => "failed",
});

impl BookingPaymentStatus {
    /// Returns the status to store after a notification, or `None` when the
    /// notification changes nothing. `Paid` is sticky so late or repeated
    /// callbacks cannot downgrade it.
    pub fn apply_notification(self, incoming: BookingPaymentStatus) -> Option<BookingPaymentStatus> {
        if self == incoming || self == BookingPaymentStatus::Paid {
            None
        } else {
            Some(incoming)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Partial,
    Paid,
}

text_enum!(InvoiceStatus, "invoice status", {
    Draft => "draft",
    Partial => "partial",
    Paid => "paid",
});

impl InvoiceStatus {
    /// Status from the payments received. An invoice with nothing billed
    /// yet stays a draft rather than counting as settled.
    pub fn derive(total_amount: i64, paid_amount: i64) -> InvoiceStatus {
        if total_amount <= 0 && paid_amount <= 0 {
            InvoiceStatus::Draft
        } else if paid_amount >= total_amount {
            InvoiceStatus::Paid
        } else if paid_amount > 0 {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Draft
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    BankTransfer,
    Voucher,
    Momo,
}

text_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    CreditCard => "credit_card",
    BankTransfer => "bank_transfer",
    Voucher => "voucher",
    Momo => "momo",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(CheckedIn.can_transition_to(CheckedOut));

        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!CheckedIn.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!CheckedOut.can_transition_to(CheckedIn));
        for status in BookingStatus::ALL {
            assert!(!CheckedOut.can_transition_to(*status));
            assert!(!Cancelled.can_transition_to(*status));
        }
    }

    #[test]
    fn cancellable_and_editable_sets() {
        use BookingStatus::*;
        assert!(Pending.is_cancellable());
        assert!(Confirmed.is_cancellable());
        assert!(Cancelled.is_cancellable());
        assert!(!CheckedIn.is_cancellable());
        assert!(!CheckedOut.is_cancellable());

        assert!(Pending.is_editable());
        assert!(Confirmed.is_editable());
        assert!(!CheckedIn.is_editable());
        assert!(!CheckedOut.is_editable());
        assert!(!Cancelled.is_editable());
    }

    #[test]
    fn status_text_parses_back() {
        assert_eq!("checked_in".parse::<BookingStatus>().unwrap(), BookingStatus::CheckedIn);
        assert_eq!("out_of_order".parse::<RoomStatus>().unwrap(), RoomStatus::OutOfOrder);
        assert_eq!(PaymentMethod::BankTransfer.to_string(), "bank_transfer");
        let err = "archived".parse::<InvoiceStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown invoice status value `archived`");
    }

    #[test]
    fn invoice_status_follows_paid_amount() {
        assert_eq!(InvoiceStatus::derive(1_100_000, 0), InvoiceStatus::Draft);
        assert_eq!(InvoiceStatus::derive(1_100_000, 500_000), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::derive(1_100_000, 1_100_000), InvoiceStatus::Paid);
    }

    #[test]
    fn empty_invoice_is_a_draft() {
        assert_eq!(InvoiceStatus::derive(0, 0), InvoiceStatus::Draft);
    }

    #[test]
    fn paid_notification_is_sticky_and_idempotent() {
        use BookingPaymentStatus::*;
        assert_eq!(Unpaid.apply_notification(Paid), Some(Paid));
        assert_eq!(Paid.apply_notification(Paid), None);
        assert_eq!(Paid.apply_notification(Failed), None);
        assert_eq!(Failed.apply_notification(Paid), Some(Paid));
    }
}
