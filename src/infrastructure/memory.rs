//! In-memory store for exercising the services without Postgres.
//!
//! A transaction works on a copy of the whole state and swaps it in on
//! commit, so a rolled-back transaction leaves no trace. Transactions are
//! serialized by a mutex.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use crate::domain::errors::{DomainError, RepoError};
use crate::domain::order::{NewOrderItem, Order, OrderItem};
use crate::domain::ports::{InventoryRepository, OrderRepository, Transactor};
use crate::domain::product::{NewProduct, Product, ProductDetails};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub products: BTreeMap<i64, Product>,
    pub orders: BTreeMap<i64, Order>,
    pub order_items: Vec<OrderItem>,
    next_id: i64,
    fail_on: Option<&'static str>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, operation: &'static str) -> Result<(), RepoError> {
        match self.fail_on {
            Some(op) if op == operation => {
                Err(RepoError::Backend(format!("injected failure in {op}").into()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    transactions: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn seed_product(&self, name: &str, price: i64, stock: i32) -> Product {
        self.with_state(|state| {
            let product = Product {
                id: state.next_id(),
                name: name.to_string(),
                description: None,
                price,
                stock,
                created_at: Utc::now(),
            };
            state.products.insert(product.id, product.clone());
            product
        })
    }

    pub fn set_price(&self, id: i64, price: i64) {
        self.with_state(|state| {
            if let Some(product) = state.products.get_mut(&id) {
                product.price = price;
            }
        });
    }

    /// Makes every later call to the named repository operation fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.with_state(|state| state.fail_on = Some(operation));
    }

    pub fn stock_of(&self, id: i64) -> i32 {
        self.with_state(|state| state.products.get(&id).map_or(0, |p| p.stock))
    }

    pub fn snapshot(&self) -> MemoryState {
        self.with_state(|state| state.clone())
    }

    pub fn transactions_opened(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

impl Transactor for MemoryStore {
    type Conn = MemoryState;

    fn transaction<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut MemoryState) -> Result<R, DomainError>,
    {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        // The lock is held for the whole closure: transactions never overlap.
        self.with_state(|committed| -> Result<R, DomainError> {
            let mut working = committed.clone();
            let value = f(&mut working)?;
            *committed = working;
            Ok(value)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryInventory;

impl InventoryRepository<MemoryState> for MemoryInventory {
    fn find_product_by_id(&self, conn: &mut MemoryState, id: i64) -> Result<Product, RepoError> {
        conn.check("FindProductByID")?;
        conn.products.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    fn decrement_stock(
        &self,
        conn: &mut MemoryState,
        id: i64,
        quantity: i32,
    ) -> Result<Option<Product>, RepoError> {
        conn.check("UpdateProductStock")?;
        Ok(conn
            .products
            .get_mut(&id)
            .filter(|p| p.stock >= quantity)
            .map(|p| {
                p.stock -= quantity;
                p.clone()
            }))
    }

    fn product_exists(&self, conn: &mut MemoryState, name: &str) -> Result<bool, RepoError> {
        conn.check("ProductExists")?;
        Ok(conn.products.values().any(|p| p.name == name))
    }

    fn create_product(
        &self,
        conn: &mut MemoryState,
        product: &NewProduct,
    ) -> Result<Product, RepoError> {
        conn.check("CreateProduct")?;
        if conn.products.values().any(|p| p.name == product.name) {
            return Err(RepoError::UniqueViolation("products_name_key".to_string()));
        }
        let created = Product {
            id: conn.next_id(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            created_at: Utc::now(),
        };
        conn.products.insert(created.id, created.clone());
        Ok(created)
    }

    fn list_products(&self, conn: &mut MemoryState) -> Result<Vec<Product>, RepoError> {
        conn.check("ListProducts")?;
        Ok(conn.products.values().cloned().collect())
    }

    fn update_product_details(
        &self,
        conn: &mut MemoryState,
        id: i64,
        details: &ProductDetails,
    ) -> Result<Product, RepoError> {
        conn.check("UpdateProductDetails")?;
        if conn
            .products
            .values()
            .any(|p| p.id != id && p.name == details.name)
        {
            return Err(RepoError::UniqueViolation("products_name_key".to_string()));
        }
        let product = conn.products.get_mut(&id).ok_or(RepoError::NotFound)?;
        product.name = details.name.clone();
        product.description = details.description.clone();
        product.price = details.price;
        Ok(product.clone())
    }

    fn delete_product(&self, conn: &mut MemoryState, id: i64) -> Result<usize, RepoError> {
        conn.check("DeleteProduct")?;
        if conn.order_items.iter().any(|i| i.product_id == id) {
            return Err(RepoError::ForeignKeyViolation(
                "order_items_product_id_fkey".to_string(),
            ));
        }
        Ok(usize::from(conn.products.remove(&id).is_some()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryOrders;

impl OrderRepository<MemoryState> for MemoryOrders {
    fn create_order(&self, conn: &mut MemoryState, customer_ref: &str) -> Result<Order, RepoError> {
        conn.check("CreateOrder")?;
        let order = Order {
            id: conn.next_id(),
            customer_ref: customer_ref.to_string(),
            total_price: 0,
            created_at: Utc::now(),
        };
        conn.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn add_order_item(
        &self,
        conn: &mut MemoryState,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepoError> {
        conn.check("AddOrderItem")?;
        let created = OrderItem {
            id: conn.next_id(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        };
        conn.order_items.push(created.clone());
        Ok(created)
    }

    fn set_order_total(
        &self,
        conn: &mut MemoryState,
        order_id: i64,
        total: i64,
    ) -> Result<(), RepoError> {
        conn.check("SetOrderTotal")?;
        let order = conn.orders.get_mut(&order_id).ok_or(RepoError::NotFound)?;
        order.total_price = total;
        Ok(())
    }

    fn get_order(&self, conn: &mut MemoryState, id: i64) -> Result<Order, RepoError> {
        conn.check("GetOrder")?;
        conn.orders.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    fn list_order_items(
        &self,
        conn: &mut MemoryState,
        order_id: i64,
    ) -> Result<Vec<OrderItem>, RepoError> {
        conn.check("ListOrderItems")?;
        Ok(conn
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    fn get_all_orders(&self, conn: &mut MemoryState) -> Result<Vec<Order>, RepoError> {
        conn.check("GetAllOrders")?;
        Ok(conn.orders.values().rev().cloned().collect())
    }

    fn get_orders_by_customer_ref(
        &self,
        conn: &mut MemoryState,
        customer_ref: &str,
    ) -> Result<Vec<Order>, RepoError> {
        conn.check("GetOrdersByCustomerRef")?;
        Ok(conn
            .orders
            .values()
            .rev()
            .filter(|o| o.customer_ref == customer_ref)
            .cloned()
            .collect())
    }

    fn delete_order_items_by_order_id(
        &self,
        conn: &mut MemoryState,
        order_id: i64,
    ) -> Result<usize, RepoError> {
        conn.check("DeleteOrderItemsByOrderID")?;
        let before = conn.order_items.len();
        conn.order_items.retain(|i| i.order_id != order_id);
        Ok(before - conn.order_items.len())
    }

    fn delete_order(&self, conn: &mut MemoryState, id: i64) -> Result<usize, RepoError> {
        conn.check("DeleteOrder")?;
        if conn.order_items.iter().any(|i| i.order_id == id) {
            return Err(RepoError::ForeignKeyViolation(
                "order_items_order_id_fkey".to_string(),
            ));
        }
        Ok(usize::from(conn.orders.remove(&id).is_some()))
    }
}
