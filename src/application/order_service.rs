use log::{debug, info, warn};

use super::context::RequestContext;
use crate::domain::errors::DomainError;
use crate::domain::order::{LineItem, NewOrderItem, Order, OrderDetails, OrderItem};
use crate::domain::ports::{InventoryRepository, OrderRepository, Transactor};

pub struct OrderService<T, I, O> {
    store: T,
    inventory: I,
    orders: O,
}

impl<T, I, O> OrderService<T, I, O>
where
    T: Transactor,
    I: InventoryRepository<T::Conn>,
    O: OrderRepository<T::Conn>,
{
    pub fn new(store: T, inventory: I, orders: O) -> Self {
        Self {
            store,
            inventory,
            orders,
        }
    }

    /// Places an order for `customer_ref`.
    ///
    /// The order row, every order item and every stock decrement are written
    /// in one transaction. Items are processed in input order; the first
    /// failing item aborts the placement and rolls everything back. The
    /// total is always computed from the stored unit prices.
    pub fn place_order(
        &self,
        ctx: &RequestContext,
        customer_ref: &str,
        items: &[LineItem],
    ) -> Result<OrderDetails, DomainError> {
        if customer_ref.is_empty() {
            return Err(DomainError::validation("customer_ref", "cannot be empty"));
        }
        if items.is_empty() {
            return Err(DomainError::validation("items", "cannot be empty"));
        }
        ctx.check("BeginTransaction")?;

        let result = self.store.transaction(|conn| {
            ctx.check("CreateOrder")?;
            let mut order = self
                .orders
                .create_order(conn, customer_ref)
                .map_err(DomainError::database("CreateOrder"))?;

            let mut total: i64 = 0;
            let mut order_items = Vec::with_capacity(items.len());
            for item in items {
                let order_item = self.reserve_item(ctx, conn, &order, item)?;
                total = order_item
                    .line_total()
                    .and_then(|line_total| total.checked_add(line_total))
                    .ok_or_else(|| {
                        DomainError::validation(
                            "total_price",
                            format!("order total overflows at product {}", item.product_id),
                        )
                    })?;
                order_items.push(order_item);
            }

            ctx.check("SetOrderTotal")?;
            self.orders
                .set_order_total(conn, order.id, total)
                .map_err(DomainError::database("SetOrderTotal"))?;
            order.total_price = total;

            ctx.check("Commit")?;
            Ok(OrderDetails {
                order,
                items: order_items,
            })
        });

        match &result {
            Ok(placed) => info!(
                "Placed order {} for customer '{}': {} item(s), total {}",
                placed.order.id,
                placed.order.customer_ref,
                placed.items.len(),
                placed.order.total_price
            ),
            Err(e) => warn!("Order placement for customer '{}' rejected: {}", customer_ref, e),
        }
        result
    }

    /// Validates one line item, takes its stock and records it on `order`.
    fn reserve_item(
        &self,
        ctx: &RequestContext,
        conn: &mut T::Conn,
        order: &Order,
        item: &LineItem,
    ) -> Result<OrderItem, DomainError> {
        if item.quantity <= 0 {
            return Err(DomainError::validation(
                "quantity",
                format!("invalid quantity for product {}", item.product_id),
            ));
        }

        ctx.check("FindProductByID")?;
        let product = self
            .inventory
            .find_product_by_id(conn, item.product_id)
            .map_err(DomainError::lookup("FindProductByID", "Product", item.product_id))?;

        if product.price <= 0 {
            return Err(DomainError::validation(
                "price",
                format!("invalid price for product {}", item.product_id),
            ));
        }
        if product.stock < item.quantity {
            return Err(insufficient_stock(item.product_id));
        }

        // The conditional decrement is what actually arbitrates between
        // concurrent placements; the check above only rejects early.
        ctx.check("UpdateProductStock")?;
        self.inventory
            .decrement_stock(conn, product.id, item.quantity)
            .map_err(DomainError::database("UpdateProductStock"))?
            .ok_or_else(|| insufficient_stock(item.product_id))?;

        ctx.check("AddOrderItem")?;
        let order_item = self
            .orders
            .add_order_item(
                conn,
                &NewOrderItem {
                    order_id: order.id,
                    product_id: product.id,
                    quantity: item.quantity,
                    unit_price: product.price,
                },
            )
            .map_err(DomainError::database("AddOrderItem"))?;

        debug!(
            "Reserved {} x product {} at {} for order {}",
            item.quantity, product.id, product.price, order.id
        );
        Ok(order_item)
    }

    pub fn get_order(&self, ctx: &RequestContext, id: i64) -> Result<OrderDetails, DomainError> {
        ctx.check("GetOrder")?;
        self.store.transaction(|conn| {
            let order = self
                .orders
                .get_order(conn, id)
                .map_err(DomainError::lookup("GetOrder", "Order", id))?;

            ctx.check("ListOrderItems")?;
            let items = self
                .orders
                .list_order_items(conn, order.id)
                .map_err(DomainError::database("ListOrderItems"))?;

            Ok(OrderDetails { order, items })
        })
    }

    pub fn get_all_orders(&self, ctx: &RequestContext) -> Result<Vec<Order>, DomainError> {
        ctx.check("GetAllOrders")?;
        self.store.transaction(|conn| {
            self.orders
                .get_all_orders(conn)
                .map_err(DomainError::database("GetAllOrders"))
        })
    }

    /// Orders placed by `customer_ref`, newest first. A customer without
    /// orders yields an empty list.
    pub fn get_orders_by_customer_ref(
        &self,
        ctx: &RequestContext,
        customer_ref: &str,
    ) -> Result<Vec<Order>, DomainError> {
        if customer_ref.is_empty() {
            return Err(DomainError::validation("customer_ref", "cannot be empty"));
        }
        ctx.check("GetOrdersByCustomerRef")?;
        self.store.transaction(|conn| {
            self.orders
                .get_orders_by_customer_ref(conn, customer_ref)
                .map_err(DomainError::database("GetOrdersByCustomerRef"))
        })
    }

    /// Deletes an order and its items, children first, in one transaction.
    pub fn delete_order(&self, ctx: &RequestContext, id: i64) -> Result<(), DomainError> {
        ctx.check("GetOrder")?;
        let removed_items = self.store.transaction(|conn| {
            self.orders
                .get_order(conn, id)
                .map_err(DomainError::lookup("GetOrder", "Order", id))?;

            ctx.check("DeleteOrderItemsByOrderID")?;
            let removed_items = self
                .orders
                .delete_order_items_by_order_id(conn, id)
                .map_err(DomainError::database("DeleteOrderItemsByOrderID"))?;

            ctx.check("DeleteOrder")?;
            self.orders
                .delete_order(conn, id)
                .map_err(DomainError::database("DeleteOrder"))?;

            ctx.check("Commit")?;
            Ok(removed_items)
        })?;

        info!("Deleted order {} with {} item(s)", id, removed_items);
        Ok(())
    }
}

fn insufficient_stock(product_id: i64) -> DomainError {
    DomainError::validation("stock", format!("not enough stock for product {product_id}"))
}
