pub mod order_manager;
pub mod order_monitoring;

pub use order_manager::{OrderManager, OrderManagerError, PaymentOutcome};
pub use order_monitoring::OrderMonitoringService;
