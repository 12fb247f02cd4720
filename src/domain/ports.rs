use std::sync::Arc;

use super::errors::{DomainError, RepoError};
use super::order::{NewOrderItem, Order, OrderItem};
use super::product::{NewProduct, Product, ProductDetails};

/// Owns begin/commit/rollback and lends the open transaction to a closure.
///
/// The closure's `Ok` commits and its `Err` rolls back; the closure's error
/// is returned unchanged after the rollback.
pub trait Transactor: Send + Sync + 'static {
    /// Handle every repository call inside the transaction is made through.
    type Conn;

    fn transaction<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut Self::Conn) -> Result<R, DomainError>;
}

impl<T: Transactor> Transactor for Arc<T> {
    type Conn = T::Conn;

    fn transaction<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut Self::Conn) -> Result<R, DomainError>,
    {
        (**self).transaction(f)
    }
}

/// Product reads and stock mutation, scoped to the caller's transaction.
pub trait InventoryRepository<C>: Send + Sync + 'static {
    fn find_product_by_id(&self, conn: &mut C, id: i64) -> Result<Product, RepoError>;

    /// Takes `quantity` units only if at least that many are in stock.
    /// Returns the updated product, or `None` when the stock was short.
    fn decrement_stock(
        &self,
        conn: &mut C,
        id: i64,
        quantity: i32,
    ) -> Result<Option<Product>, RepoError>;

    fn product_exists(&self, conn: &mut C, name: &str) -> Result<bool, RepoError>;

    fn create_product(&self, conn: &mut C, product: &NewProduct) -> Result<Product, RepoError>;

    fn list_products(&self, conn: &mut C) -> Result<Vec<Product>, RepoError>;

    fn update_product_details(
        &self,
        conn: &mut C,
        id: i64,
        details: &ProductDetails,
    ) -> Result<Product, RepoError>;

    fn delete_product(&self, conn: &mut C, id: i64) -> Result<usize, RepoError>;
}

/// Order and order-item persistence, scoped to the caller's transaction.
pub trait OrderRepository<C>: Send + Sync + 'static {
    /// Inserts an order with a zero total.
    fn create_order(&self, conn: &mut C, customer_ref: &str) -> Result<Order, RepoError>;

    fn add_order_item(&self, conn: &mut C, item: &NewOrderItem) -> Result<OrderItem, RepoError>;

    fn set_order_total(&self, conn: &mut C, order_id: i64, total: i64) -> Result<(), RepoError>;

    fn get_order(&self, conn: &mut C, id: i64) -> Result<Order, RepoError>;

    fn list_order_items(&self, conn: &mut C, order_id: i64) -> Result<Vec<OrderItem>, RepoError>;

    fn get_all_orders(&self, conn: &mut C) -> Result<Vec<Order>, RepoError>;

    fn get_orders_by_customer_ref(
        &self,
        conn: &mut C,
        customer_ref: &str,
    ) -> Result<Vec<Order>, RepoError>;

    fn delete_order_items_by_order_id(&self, conn: &mut C, order_id: i64)
        -> Result<usize, RepoError>;

    fn delete_order(&self, conn: &mut C, id: i64) -> Result<usize, RepoError>;
}
