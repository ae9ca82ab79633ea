use crate::{ApprovalStatus, Order, OrderStatus, PaymentKind, PaymentRecord, RefundStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use snafu::{ensure, OptionExt, Snafu};

#[derive(Debug, Snafu, PartialEq)]
pub enum TransitionError {
    #[snafu(display("Invalid state transition from {} to {}", from, to))]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[snafu(display("Cannot change approval from {} to {}", current, requested))]
    ApprovalConflict {
        current: ApprovalStatus,
        requested: ApprovalStatus,
    },

    #[snafu(display("Order must be approved first (currently {})", current))]
    NotApproved { current: ApprovalStatus },

    #[snafu(display("Payment of {} does not cover the {} due", received, required))]
    InsufficientPayment { required: Decimal, received: Decimal },

    #[snafu(display("Payment of {} on top of {} already paid is out of range", amount, paid))]
    PaymentOverflow { paid: Decimal, amount: Decimal },

    #[snafu(display("Order is still {} and cannot be moved to the recycle bin", status))]
    NotTerminal { status: OrderStatus },

    #[snafu(display("Order is already in the recycle bin"))]
    AlreadyDeleted,

    #[snafu(display("Order is not in the recycle bin"))]
    NotDeleted,
}

pub type TransitionResult<T = ()> = Result<T, TransitionError>;

impl Order {
    /// Record the up-front payment. Paying the whole total here skips
    /// straight to PaidInFull.
    ///
    /// Returns `Ok(false)` when `reference` was already applied, so a
    /// replayed gateway confirmation is harmless.
    pub fn record_deposit_payment(
        &mut self,
        reference: String,
        amount: Decimal,
    ) -> TransitionResult<bool> {
        if self.has_payment(&reference) {
            return Ok(false);
        }

        ensure!(
            self.status == OrderStatus::Pending,
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::DepositPaid,
            }
        );
        ensure!(
            self.approval_status != ApprovalStatus::Rejected,
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::DepositPaid,
            }
        );
        ensure!(
            amount >= self.deposit_amount,
            InsufficientPaymentSnafu {
                required: self.deposit_amount,
                received: amount,
            }
        );

        let amount_paid = self.checked_amount_paid(amount)?;

        let now = Utc::now();
        self.payments.push(PaymentRecord {
            kind: PaymentKind::Deposit,
            reference,
            amount,
            paid_at: now,
        });
        self.amount_paid = amount_paid;
        self.status = if self.amount_paid >= self.total {
            OrderStatus::PaidInFull
        } else {
            OrderStatus::DepositPaid
        };
        self.updated_at = now;

        Ok(true)
    }

    /// Record the remaining balance once the order has been approved.
    pub fn record_balance_payment(
        &mut self,
        reference: String,
        amount: Decimal,
    ) -> TransitionResult<bool> {
        if self.has_payment(&reference) {
            return Ok(false);
        }

        ensure!(
            self.status == OrderStatus::DepositPaid,
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::PaidInFull,
            }
        );
        ensure!(
            self.approval_status == ApprovalStatus::Approved,
            NotApprovedSnafu {
                current: self.approval_status,
            }
        );
        let due = self.balance_due();
        ensure!(
            amount >= due,
            InsufficientPaymentSnafu {
                required: due,
                received: amount,
            }
        );

        let amount_paid = self.checked_amount_paid(amount)?;

        let now = Utc::now();
        self.payments.push(PaymentRecord {
            kind: PaymentKind::Balance,
            reference,
            amount,
            paid_at: now,
        });
        self.amount_paid = amount_paid;
        self.status = OrderStatus::PaidInFull;
        self.updated_at = now;

        Ok(true)
    }

    fn checked_amount_paid(&self, amount: Decimal) -> TransitionResult<Decimal> {
        self.amount_paid
            .checked_add(amount)
            .context(PaymentOverflowSnafu {
                paid: self.amount_paid,
                amount,
            })
    }

    pub fn approve(&mut self) -> TransitionResult {
        ensure!(
            self.approval_status == ApprovalStatus::PendingApproval,
            ApprovalConflictSnafu {
                current: self.approval_status,
                requested: ApprovalStatus::Approved,
            }
        );
        ensure!(
            !self.status.is_terminal(),
            ApprovalConflictSnafu {
                current: self.approval_status,
                requested: ApprovalStatus::Approved,
            }
        );

        self.approval_status = ApprovalStatus::Approved;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reject the order. Whatever was collected goes back to the buyer.
    pub fn reject(&mut self, reason: Option<String>) -> TransitionResult {
        ensure!(
            self.approval_status != ApprovalStatus::Rejected,
            ApprovalConflictSnafu {
                current: self.approval_status,
                requested: ApprovalStatus::Rejected,
            }
        );
        let to = if self.status.is_paid() {
            OrderStatus::Refunded
        } else {
            OrderStatus::Cancelled
        };
        ensure!(
            !self.status.is_terminal(),
            InvalidTransitionSnafu {
                from: self.status,
                to,
            }
        );

        if self.status.is_paid() {
            self.refund_status = RefundStatus::DepositRefunded;
        }
        self.approval_status = ApprovalStatus::Rejected;
        self.status = to;
        self.reject_reason = reason;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Buyer-initiated cancellation. A paid deposit is forfeited.
    pub fn cancel(&mut self, reason: Option<String>) -> TransitionResult {
        ensure!(
            matches!(self.status, OrderStatus::Pending | OrderStatus::DepositPaid),
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::Cancelled,
            }
        );

        if self.status == OrderStatus::DepositPaid {
            self.refund_status = RefundStatus::DepositLost;
        }
        self.status = OrderStatus::Cancelled;
        self.cancel_reason = reason;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Seller-initiated refund of everything collected.
    pub fn refund(&mut self, reason: Option<String>) -> TransitionResult {
        ensure!(
            self.status.is_paid(),
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::Refunded,
            }
        );

        self.status = OrderStatus::Refunded;
        self.refund_status = RefundStatus::DepositRefunded;
        self.cancel_reason = reason;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_completed(&mut self) -> TransitionResult {
        ensure!(
            self.status == OrderStatus::PaidInFull,
            InvalidTransitionSnafu {
                from: self.status,
                to: OrderStatus::Completed,
            }
        );
        ensure!(
            self.approval_status == ApprovalStatus::Approved,
            NotApprovedSnafu {
                current: self.approval_status,
            }
        );

        let now = Utc::now();
        self.status = OrderStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Admin console "set status" dropdown. Routes to the transition that
    /// reaches `target`; payments entered this way are offline (bank
    /// transfer) and get a deterministic `manual:` reference.
    pub fn update_status(&mut self, target: OrderStatus) -> TransitionResult {
        match target {
            OrderStatus::DepositPaid => {
                let reference = self.manual_reference(PaymentKind::Deposit);
                self.record_deposit_payment(reference, self.deposit_amount)
                    .map(|_| ())
            }
            OrderStatus::PaidInFull => match self.status {
                OrderStatus::Pending => {
                    let reference = self.manual_reference(PaymentKind::Deposit);
                    self.record_deposit_payment(reference, self.total).map(|_| ())
                }
                _ => {
                    let reference = self.manual_reference(PaymentKind::Balance);
                    self.record_balance_payment(reference, self.balance_due())
                        .map(|_| ())
                }
            },
            OrderStatus::Cancelled => self.cancel(None),
            OrderStatus::Refunded => self.refund(None),
            OrderStatus::Completed => self.mark_completed(),
            OrderStatus::Pending => Err(TransitionError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Pending,
            }),
        }
    }

    pub fn update_approval(
        &mut self,
        target: ApprovalStatus,
        reason: Option<String>,
    ) -> TransitionResult {
        match target {
            ApprovalStatus::Approved => self.approve(),
            ApprovalStatus::Rejected => self.reject(reason),
            ApprovalStatus::PendingApproval => Err(TransitionError::ApprovalConflict {
                current: self.approval_status,
                requested: ApprovalStatus::PendingApproval,
            }),
        }
    }

    /// Move a closed order to the recycle bin.
    pub fn soft_delete(&mut self) -> TransitionResult {
        ensure!(!self.is_delete, AlreadyDeletedSnafu);
        ensure!(
            self.status.is_terminal(),
            NotTerminalSnafu {
                status: self.status,
            }
        );

        let now = Utc::now();
        self.is_delete = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn restore(&mut self) -> TransitionResult {
        ensure!(self.is_delete, NotDeletedSnafu);

        self.is_delete = false;
        self.deleted_at = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn manual_reference(&self, kind: PaymentKind) -> String {
        let kind = match kind {
            PaymentKind::Deposit => "deposit",
            PaymentKind::Balance => "balance",
        };
        format!("manual:{}:{}", self.order_number, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderItem, ShippingInfo};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn create_test_order() -> Order {
        Order::new_pending(
            "ORD-TEST0001".to_string(),
            Uuid::new_v4(),
            vec![OrderItem {
                product_id: Uuid::new_v4(),
                product_name: "Tablet press".to_string(),
                unit_price: dec!(500),
                quantity: 2,
            }],
            ShippingInfo::default(),
            dec!(1000),
            dec!(30),
            dec!(300),
        )
    }

    #[test]
    fn test_deposit_payment() {
        let mut order = create_test_order();

        let applied = order
            .record_deposit_payment("cs_test_1".to_string(), dec!(300))
            .unwrap();

        assert!(applied);
        assert_eq!(order.status, OrderStatus::DepositPaid);
        assert_eq!(order.amount_paid, dec!(300));
        assert_eq!(order.balance_due(), dec!(700));
        assert_eq!(order.payments.len(), 1);

        // Replayed confirmation is a no-op
        let applied = order
            .record_deposit_payment("cs_test_1".to_string(), dec!(300))
            .unwrap();
        assert!(!applied);
        assert_eq!(order.amount_paid, dec!(300));

        // A second, different deposit is not allowed
        let result = order.record_deposit_payment("cs_test_2".to_string(), dec!(300));
        assert!(matches!(result, Err(TransitionError::InvalidTransition { .. })));
    }

    #[test]
    fn test_deposit_below_required_amount() {
        let mut order = create_test_order();

        let result = order.record_deposit_payment("cs_low".to_string(), dec!(299.99));

        assert_eq!(
            result,
            Err(TransitionError::InsufficientPayment {
                required: dec!(300),
                received: dec!(299.99),
            })
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.payments.is_empty());
    }

    #[test]
    fn test_full_payment_up_front() {
        let mut order = create_test_order();

        order
            .record_deposit_payment("cs_full".to_string(), dec!(1000))
            .unwrap();

        assert_eq!(order.status, OrderStatus::PaidInFull);
        assert_eq!(order.balance_due(), Decimal::ZERO);
    }

    #[test]
    fn test_balance_payment_overflow_leaves_order_untouched() {
        let mut order = create_test_order();
        order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .unwrap();
        order.approve().unwrap();
        let updated_at = order.updated_at;

        let result = order.record_balance_payment("cs_huge".to_string(), Decimal::MAX);

        assert_eq!(
            result,
            Err(TransitionError::PaymentOverflow {
                paid: dec!(300),
                amount: Decimal::MAX,
            })
        );
        assert_eq!(order.status, OrderStatus::DepositPaid);
        assert_eq!(order.amount_paid, dec!(300));
        assert_eq!(order.payments.len(), 1);
        assert_eq!(order.updated_at, updated_at);
    }

    #[test]
    fn test_full_happy_path() {
        let mut order = create_test_order();

        order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .unwrap();
        order.approve().unwrap();
        assert_eq!(order.approval_status, ApprovalStatus::Approved);

        order
            .record_balance_payment("cs_bal".to_string(), dec!(700))
            .unwrap();
        assert_eq!(order.status, OrderStatus::PaidInFull);

        order.mark_completed().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
        assert!(!order.is_active());
    }

    #[test]
    fn test_balance_requires_approval() {
        let mut order = create_test_order();
        order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .unwrap();

        let result = order.record_balance_payment("cs_bal".to_string(), dec!(700));

        assert_eq!(
            result,
            Err(TransitionError::NotApproved {
                current: ApprovalStatus::PendingApproval
            })
        );
        assert_eq!(order.status, OrderStatus::DepositPaid);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut order = create_test_order();
        order
            .record_deposit_payment("cs_full".to_string(), dec!(1000))
            .unwrap();
        order.approve().unwrap();
        order.mark_completed().unwrap();

        assert!(order.cancel(None).is_err());
        assert!(order.refund(None).is_err());
        assert!(order.reject(None).is_err());
        assert!(order.mark_completed().is_err());
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn test_cancel_after_deposit_forfeits_it() {
        let mut order = create_test_order();
        order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .unwrap();

        order.cancel(Some("changed supplier".to_string())).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.refund_status, RefundStatus::DepositLost);
        assert_eq!(order.cancel_reason.as_deref(), Some("changed supplier"));
    }

    #[test]
    fn test_cancel_unpaid_order_has_no_refund() {
        let mut order = create_test_order();

        order.cancel(None).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.refund_status, RefundStatus::None);
    }

    #[test]
    fn test_cannot_approve_cancelled_order() {
        let mut order = create_test_order();
        order.cancel(None).unwrap();

        let result = order.approve();

        assert!(matches!(result, Err(TransitionError::ApprovalConflict { .. })));
        assert_eq!(order.approval_status, ApprovalStatus::PendingApproval);
    }

    #[test]
    fn test_reject_paid_order_refunds_deposit() {
        let mut order = create_test_order();
        order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .unwrap();

        order.reject(Some("export licence missing".to_string())).unwrap();

        assert_eq!(order.approval_status, ApprovalStatus::Rejected);
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.refund_status, RefundStatus::DepositRefunded);
    }

    #[test]
    fn test_reject_unpaid_order_cancels_it() {
        let mut order = create_test_order();

        order.reject(None).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.refund_status, RefundStatus::None);
        // Rejected orders cannot take a deposit afterwards
        assert!(order
            .record_deposit_payment("cs_dep".to_string(), dec!(300))
            .is_err());
    }

    #[test]
    fn test_update_status_routes_to_transitions() {
        let mut order = create_test_order();

        order.update_status(OrderStatus::DepositPaid).unwrap();
        assert_eq!(order.status, OrderStatus::DepositPaid);
        assert_eq!(order.payments[0].reference, "manual:ORD-TEST0001:deposit");

        assert!(order.update_status(OrderStatus::PaidInFull).is_err());
        order.update_approval(ApprovalStatus::Approved, None).unwrap();
        order.update_status(OrderStatus::PaidInFull).unwrap();
        assert_eq!(order.amount_paid, dec!(1000));

        order.update_status(OrderStatus::Completed).unwrap();
        assert_eq!(
            order.update_status(OrderStatus::Pending),
            Err(TransitionError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending,
            })
        );
    }

    #[test]
    fn test_update_approval_cannot_reset_to_pending() {
        let mut order = create_test_order();
        order.approve().unwrap();

        let result = order.update_approval(ApprovalStatus::PendingApproval, None);

        assert!(result.is_err());
        assert_eq!(order.approval_status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_recycle_bin() {
        let mut order = create_test_order();
        assert_eq!(
            order.soft_delete(),
            Err(TransitionError::NotTerminal {
                status: OrderStatus::Pending
            })
        );

        order.cancel(None).unwrap();
        order.soft_delete().unwrap();
        assert!(order.is_delete);
        assert!(order.deleted_at.is_some());
        assert_eq!(order.soft_delete(), Err(TransitionError::AlreadyDeleted));

        order.restore().unwrap();
        assert!(!order.is_delete);
        assert_eq!(order.restore(), Err(TransitionError::NotDeleted));
    }
}
