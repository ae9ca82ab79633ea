use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "order_status", rename_all = "snake_case"))]
pub enum OrderStatus {
    Pending,     // Placed, nothing collected yet
    DepositPaid, // Deposit collected, balance outstanding
    PaidInFull,  // Balance collected
    Cancelled,
    Refunded,
    Completed, // Delivered and closed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "approval_status", rename_all = "snake_case"))]
pub enum ApprovalStatus {
    PendingApproval,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "refund_status", rename_all = "snake_case"))]
pub enum RefundStatus {
    None,
    DepositLost,     // Buyer cancelled after paying, deposit kept
    DepositRefunded, // Money returned to the buyer
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Unknown {} '{}'", kind, value))]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::DepositPaid,
        OrderStatus::PaidInFull,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
        OrderStatus::Completed,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::DepositPaid => "deposit_paid",
            OrderStatus::PaidInFull => "paid_in_full",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::DepositPaid => "Deposit Paid",
            OrderStatus::PaidInFull => "Paid in Full",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Completed => "Completed",
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Completed
        )
    }

    /// Money has been collected and not yet returned.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::DepositPaid | OrderStatus::PaidInFull)
    }
}

impl ApprovalStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::PendingApproval => "pending_approval",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalStatus::PendingApproval => "Pending Approval",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl RefundStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::None => "none",
            RefundStatus::DepositLost => "deposit_lost",
            RefundStatus::DepositRefunded => "deposit_refunded",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            RefundStatus::None => "None",
            RefundStatus::DepositLost => "Deposit Lost",
            RefundStatus::DepositRefunded => "Deposit Refunded",
        }
    }
}

macro_rules! impl_status_text {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ParseStatusError;

            /// Accepts the wire tag (`deposit_paid`) or the console label (`Deposit Paid`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                [$($variant),+]
                    .into_iter()
                    .find(|v| {
                        v.as_str().eq_ignore_ascii_case(needle)
                            || v.label().eq_ignore_ascii_case(needle)
                    })
                    .ok_or_else(|| ParseStatusError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

impl_status_text!(
    OrderStatus,
    "order status",
    [
        OrderStatus::Pending,
        OrderStatus::DepositPaid,
        OrderStatus::PaidInFull,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
        OrderStatus::Completed,
    ]
);
impl_status_text!(
    ApprovalStatus,
    "approval status",
    [
        ApprovalStatus::PendingApproval,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ]
);
impl_status_text!(
    RefundStatus,
    "refund status",
    [
        RefundStatus::None,
        RefundStatus::DepositLost,
        RefundStatus::DepositRefunded,
    ]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_tag_and_label() {
        assert_eq!("deposit_paid".parse::<OrderStatus>().unwrap(), OrderStatus::DepositPaid);
        assert_eq!("Paid in Full".parse::<OrderStatus>().unwrap(), OrderStatus::PaidInFull);
        assert_eq!(
            "pending approval".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::PendingApproval
        );
        assert_eq!("Deposit Lost".parse::<RefundStatus>().unwrap(), RefundStatus::DepositLost);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaidInFull).unwrap();
        assert_eq!(json, "\"paid_in_full\"");
        let back: RefundStatus = serde_json::from_str("\"deposit_refunded\"").unwrap();
        assert_eq!(back, RefundStatus::DepositRefunded);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![&OrderStatus::Cancelled, &OrderStatus::Refunded, &OrderStatus::Completed]
        );
        assert!(OrderStatus::DepositPaid.is_paid());
        assert!(!OrderStatus::Pending.is_paid());
    }
}
