use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::domain::errors::RepoError;
use crate::domain::order::{NewOrderItem, Order, OrderItem};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

#[derive(Debug, Clone, Copy, Default)]
pub struct DieselOrderRepository;

impl OrderRepository<PgConnection> for DieselOrderRepository {
    fn create_order(&self, conn: &mut PgConnection, customer_ref: &str) -> Result<Order, RepoError> {
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                customer_ref,
                total_price: 0,
            })
            .returning(OrderRow::as_returning())
            .get_result(conn)?;
        Ok(row.into())
    }

    fn add_order_item(
        &self,
        conn: &mut PgConnection,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepoError> {
        let row = diesel::insert_into(order_items::table)
            .values(&NewOrderItemRow {
                order_id: item.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .returning(OrderItemRow::as_returning())
            .get_result(conn)?;
        Ok(row.into())
    }

    fn set_order_total(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
        total: i64,
    ) -> Result<(), RepoError> {
        let updated = diesel::update(orders::table.find(order_id))
            .set(orders::total_price.eq(total))
            .execute(conn)?;
        if updated == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    fn get_order(&self, conn: &mut PgConnection, id: i64) -> Result<Order, RepoError> {
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(conn)?;
        Ok(row.into())
    }

    fn list_order_items(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
    ) -> Result<Vec<OrderItem>, RepoError> {
        let rows = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .select(OrderItemRow::as_select())
            .order(order_items::id.asc())
            .load(conn)?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    fn get_all_orders(&self, conn: &mut PgConnection) -> Result<Vec<Order>, RepoError> {
        let rows = orders::table
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .load(conn)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn get_orders_by_customer_ref(
        &self,
        conn: &mut PgConnection,
        customer_ref: &str,
    ) -> Result<Vec<Order>, RepoError> {
        let rows = orders::table
            .filter(orders::customer_ref.eq(customer_ref))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .load(conn)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn delete_order_items_by_order_id(
        &self,
        conn: &mut PgConnection,
        order_id: i64,
    ) -> Result<usize, RepoError> {
        Ok(
            diesel::delete(order_items::table.filter(order_items::order_id.eq(order_id)))
                .execute(conn)?,
        )
    }

    fn delete_order(&self, conn: &mut PgConnection, id: i64) -> Result<usize, RepoError> {
        Ok(diesel::delete(orders::table.find(id)).execute(conn)?)
    }
}
