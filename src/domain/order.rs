use chrono::{DateTime, Utc};

/// One requested `(product, quantity)` pair of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub customer_ref: String,
    /// Smallest currency unit.
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Product price captured when the order was placed.
    pub unit_price: i64,
}

impl OrderItem {
    /// `unit_price × quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
}

/// An order together with its items, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
