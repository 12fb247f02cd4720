use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::domain::errors::RepoError;
use crate::domain::ports::InventoryRepository;
use crate::domain::product::{NewProduct, Product, ProductDetails};
use crate::schema::products;

use super::models::{NewProductRow, ProductDetailsRow, ProductRow};

#[derive(Debug, Clone, Copy, Default)]
pub struct DieselInventoryRepository;

impl InventoryRepository<PgConnection> for DieselInventoryRepository {
    fn find_product_by_id(&self, conn: &mut PgConnection, id: i64) -> Result<Product, RepoError> {
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(conn)?;
        Ok(row.into())
    }

    fn decrement_stock(
        &self,
        conn: &mut PgConnection,
        id: i64,
        quantity: i32,
    ) -> Result<Option<Product>, RepoError> {
        // Compare-and-set: a concurrent writer holding the row lock makes us
        // wait, after which the predicate is re-checked against its result.
        let row = diesel::update(
            products::table
                .filter(products::id.eq(id))
                .filter(products::stock.ge(quantity)),
        )
        .set(products::stock.eq(products::stock - quantity))
        .returning(ProductRow::as_returning())
        .get_result(conn)
        .optional()?;
        Ok(row.map(Product::from))
    }

    fn product_exists(&self, conn: &mut PgConnection, name: &str) -> Result<bool, RepoError> {
        let exists: bool = diesel::select(diesel::dsl::exists(
            products::table.filter(products::name.eq(name)),
        ))
        .get_result(conn)?;
        Ok(exists)
    }

    fn create_product(
        &self,
        conn: &mut PgConnection,
        product: &NewProduct,
    ) -> Result<Product, RepoError> {
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                name: &product.name,
                description: product.description.as_deref(),
                price: product.price,
                stock: product.stock,
            })
            .returning(ProductRow::as_returning())
            .get_result(conn)?;
        Ok(row.into())
    }

    fn list_products(&self, conn: &mut PgConnection) -> Result<Vec<Product>, RepoError> {
        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::id.asc())
            .load(conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn update_product_details(
        &self,
        conn: &mut PgConnection,
        id: i64,
        details: &ProductDetails,
    ) -> Result<Product, RepoError> {
        let row = diesel::update(products::table.find(id))
            .set(&ProductDetailsRow {
                name: &details.name,
                description: details.description.as_deref(),
                price: details.price,
            })
            .returning(ProductRow::as_returning())
            .get_result(conn)?;
        Ok(row.into())
    }

    fn delete_product(&self, conn: &mut PgConnection, id: i64) -> Result<usize, RepoError> {
        Ok(diesel::delete(products::table.find(id)).execute(conn)?)
    }
}
