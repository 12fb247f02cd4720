use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Smallest currency unit. Must be positive for the product to be orderable.
    pub price: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
}

/// Catalog fields that can be edited after creation. Stock is only changed
/// by order placement.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}
