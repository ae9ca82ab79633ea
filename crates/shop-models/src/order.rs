use crate::{ApprovalStatus, OrderStatus, RefundStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    // Human-facing reference printed on invoices, e.g. ORD-7K2M9QXA
    pub order_number: String,
    pub user_id: Uuid,

    // Snapshot of the cart at checkout (JSONB in database)
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,

    pub total: Decimal,
    // Percent (0-100) chosen from the deposit schedule at checkout
    pub deposit_percent: Decimal,
    pub deposit_amount: Decimal,
    pub amount_paid: Decimal,

    // Lifecycle, see order_transitions.rs
    pub status: OrderStatus,
    pub approval_status: ApprovalStatus,
    pub refund_status: RefundStatus,

    // Gateway confirmations (JSONB in database)
    pub payments: Vec<PaymentRecord>,

    pub cancel_reason: Option<String>,
    pub reject_reason: Option<String>,

    // Recycle bin
    pub is_delete: bool,
    pub deleted_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub recipient_name: String,
    pub phone: String,
    pub address: String,
    pub company: Option<String>,
    pub note: Option<String>,
}

impl ShippingInfo {
    /// First required field left blank, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Deposit,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub kind: PaymentKind,
    // Gateway reference (checkout session / payment intent id)
    pub reference: String,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

impl Order {
    /// Builds a freshly placed order: nothing paid, awaiting approval.
    #[must_use]
    pub fn new_pending(
        order_number: String,
        user_id: Uuid,
        items: Vec<OrderItem>,
        shipping: ShippingInfo,
        total: Decimal,
        deposit_percent: Decimal,
        deposit_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number,
            user_id,
            items,
            shipping,
            total,
            deposit_percent,
            deposit_amount,
            amount_paid: Decimal::ZERO,
            status: OrderStatus::Pending,
            approval_status: ApprovalStatus::PendingApproval,
            refund_status: RefundStatus::None,
            payments: Vec::new(),
            cancel_reason: None,
            reject_reason: None,
            is_delete: false,
            deleted_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Outstanding amount; never negative.
    #[must_use]
    pub fn balance_due(&self) -> Decimal {
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }

    /// Whether stock has been taken out of inventory for this order.
    ///
    /// Stock is deducted together with the first confirmed payment, so any
    /// order holding a payment has reserved its items.
    #[must_use]
    pub fn holds_stock(&self) -> bool {
        self.status.is_paid() || self.status == OrderStatus::Completed
    }

    #[must_use]
    pub fn has_payment(&self, reference: &str) -> bool {
        self.payments.iter().any(|p| p.reference == reference)
    }

    /// Check if order is still moving through the lifecycle
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal() && !self.is_delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shipping_missing_field() {
        let mut shipping = ShippingInfo {
            recipient_name: "QA lab".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            address: "  ".to_string(),
            company: None,
            note: None,
        };
        assert_eq!(shipping.missing_field(), Some("address"));

        shipping.address = "Unit 4, Science Park".to_string();
        assert_eq!(shipping.missing_field(), None);
        assert_eq!(ShippingInfo::default().missing_field(), Some("recipient_name"));
    }

    #[test]
    fn test_balance_due_never_negative() {
        let mut order = Order::new_pending(
            "ORD-BAL00001".to_string(),
            Uuid::new_v4(),
            Vec::new(),
            ShippingInfo::default(),
            dec!(100),
            dec!(50),
            dec!(50),
        );
        assert_eq!(order.balance_due(), dec!(100));
        assert!(!order.holds_stock());

        order.amount_paid = dec!(120);
        assert_eq!(order.balance_due(), Decimal::ZERO);
    }
}
