//! Orders and transaction audit records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::menu::SizeLabel;
use crate::types::{MenuItemId, OrderId, OrderStatus, TransactionId};

/// One ordered line: a menu item at a chosen size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    /// Populated from the catalog at placement time for display.
    pub menu_item_name: String,
    pub size: SizeLabel,
    pub quantity: u32,
    /// Unit price of the chosen size at placement time.
    pub unit_price: Decimal,
}

impl OrderLine {
    /// Line subtotal.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A customer order.
///
/// Stock moves only when the order transitions to `Completed`; a pending
/// order reserves nothing. Completed and cancelled are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub table_number: u32,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    /// Client-supplied dedupe key; a replay returns this record unchanged.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Bill total across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// Audit record appended when an order reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub table_number: u32,
    pub customer_name: String,
    pub total: Decimal,
    pub final_status: OrderStatus,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn order_total_sums_line_subtotals() {
        let line = |price: Decimal, quantity: u32| OrderLine {
            menu_item_id: MenuItemId::new(),
            menu_item_name: "Miso Ramen".to_string(),
            size: SizeLabel::Classic,
            quantity,
            unit_price: price,
        };
        let order = Order {
            id: OrderId::new(),
            table_number: 4,
            customer_name: "Aki".to_string(),
            lines: vec![line(dec!(185), 2), line(dec!(95), 1)],
            status: OrderStatus::Pending,
            idempotency_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(order.total(), dec!(465));
    }
}
