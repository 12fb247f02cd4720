use log::info;

use super::context::RequestContext;
use crate::domain::errors::{DomainError, RepoError};
use crate::domain::ports::{InventoryRepository, Transactor};
use crate::domain::product::{NewProduct, Product, ProductDetails};

/// Catalog maintenance: single-product operations outside order placement.
pub struct ProductService<T, I> {
    store: T,
    inventory: I,
}

impl<T, I> ProductService<T, I>
where
    T: Transactor,
    I: InventoryRepository<T::Conn>,
{
    pub fn new(store: T, inventory: I) -> Self {
        Self { store, inventory }
    }

    pub fn create_product(
        &self,
        ctx: &RequestContext,
        product: NewProduct,
    ) -> Result<Product, DomainError> {
        validate_details(&product.name, product.price)?;
        if product.stock < 0 {
            return Err(DomainError::validation("stock", "cannot be negative"));
        }
        ctx.check("ProductExists")?;

        let created = self.store.transaction(|conn| {
            let exists = self
                .inventory
                .product_exists(conn, &product.name)
                .map_err(DomainError::database("ProductExists"))?;
            if exists {
                return Err(DomainError::already_exists("Product", &product.name));
            }

            ctx.check("CreateProduct")?;
            self.inventory
                .create_product(conn, &product)
                .map_err(|e| name_conflict(e, "CreateProduct", &product.name))
        })?;

        info!("Created product {} '{}'", created.id, created.name);
        Ok(created)
    }

    pub fn find_product(&self, ctx: &RequestContext, id: i64) -> Result<Product, DomainError> {
        ctx.check("FindProductByID")?;
        self.store.transaction(|conn| {
            self.inventory
                .find_product_by_id(conn, id)
                .map_err(DomainError::lookup("FindProductByID", "Product", id))
        })
    }

    pub fn list_products(&self, ctx: &RequestContext) -> Result<Vec<Product>, DomainError> {
        ctx.check("ListProducts")?;
        self.store.transaction(|conn| {
            self.inventory
                .list_products(conn)
                .map_err(DomainError::database("ListProducts"))
        })
    }

    pub fn update_product_details(
        &self,
        ctx: &RequestContext,
        id: i64,
        details: ProductDetails,
    ) -> Result<Product, DomainError> {
        validate_details(&details.name, details.price)?;
        ctx.check("UpdateProductDetails")?;

        self.store.transaction(|conn| {
            self.inventory
                .update_product_details(conn, id, &details)
                .map_err(|e| match e {
                    RepoError::NotFound => DomainError::not_found("Product", id),
                    e => name_conflict(e, "UpdateProductDetails", &details.name),
                })
        })
    }

    pub fn delete_product(&self, ctx: &RequestContext, id: i64) -> Result<(), DomainError> {
        ctx.check("FindProductByID")?;
        self.store.transaction(|conn| {
            self.inventory
                .find_product_by_id(conn, id)
                .map_err(DomainError::lookup("FindProductByID", "Product", id))?;

            ctx.check("DeleteProduct")?;
            self.inventory
                .delete_product(conn, id)
                .map_err(|e| match e {
                    RepoError::ForeignKeyViolation(_) => DomainError::validation(
                        "id",
                        format!("product {id} is referenced by existing orders"),
                    ),
                    e => DomainError::database("DeleteProduct")(e),
                })?;
            Ok(())
        })?;

        info!("Deleted product {}", id);
        Ok(())
    }
}

fn validate_details(name: &str, price: i64) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation("name", "cannot be empty"));
    }
    if price < 0 {
        return Err(DomainError::validation("price", "cannot be negative"));
    }
    Ok(())
}

/// A unique-name violation that slipped past the existence check (a
/// concurrent insert, or a rename) is still a conflict, not a server fault.
fn name_conflict(e: RepoError, operation: &'static str, name: &str) -> DomainError {
    match e {
        RepoError::UniqueViolation(_) => DomainError::already_exists("Product", name),
        e => DomainError::database(operation)(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::infrastructure::memory::{MemoryInventory, MemoryStore};

    fn service() -> (Arc<MemoryStore>, ProductService<Arc<MemoryStore>, MemoryInventory>) {
        let store = Arc::new(MemoryStore::new());
        let svc = ProductService::new(Arc::clone(&store), MemoryInventory);
        (store, svc)
    }

    fn new_product(name: &str, price: i64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: Some("test product".to_string()),
            price,
            stock,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::background()
    }

    #[test]
    fn create_then_find_product() {
        let (_store, svc) = service();

        let created = svc
            .create_product(&ctx(), new_product("widget", 500, 3))
            .expect("create should succeed");
        let found = svc
            .find_product(&ctx(), created.id)
            .expect("product should exist");

        assert_eq!(found, created);
        assert_eq!(found.stock, 3);
    }

    #[test]
    fn create_rejects_invalid_fields_without_storage() {
        let (store, svc) = service();

        let cases = [
            (new_product("", 100, 1), "name"),
            (new_product("widget", -1, 1), "price"),
            (new_product("widget", 100, -1), "stock"),
        ];
        for (product, expected_field) in cases {
            let err = svc
                .create_product(&ctx(), product)
                .expect_err("invalid product must be rejected");
            assert!(
                matches!(&err, DomainError::Validation { field, .. } if *field == expected_field),
                "expected validation on {expected_field}, got {err}"
            );
        }
        assert_eq!(store.transactions_opened(), 0);
    }

    #[test]
    fn duplicate_name_already_exists() {
        let (_store, svc) = service();
        svc.create_product(&ctx(), new_product("widget", 500, 3))
            .expect("first create should succeed");

        let err = svc
            .create_product(&ctx(), new_product("widget", 700, 1))
            .expect_err("duplicate must be rejected");

        assert!(matches!(
            err,
            DomainError::AlreadyExists { resource: "Product", ref id } if id == "widget"
        ));
    }

    #[test]
    fn find_missing_product_is_not_found() {
        let (_store, svc) = service();

        let err = svc.find_product(&ctx(), 77).expect_err("no such product");

        assert!(matches!(err, DomainError::NotFound { resource: "Product", .. }));
    }

    #[test]
    fn list_products_in_creation_order() {
        let (_store, svc) = service();
        for name in ["a", "b", "c"] {
            svc.create_product(&ctx(), new_product(name, 100, 1))
                .expect("create should succeed");
        }

        let names: Vec<String> = svc
            .list_products(&ctx())
            .expect("list should succeed")
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_details_keeps_stock() {
        let (_store, svc) = service();
        let created = svc
            .create_product(&ctx(), new_product("widget", 500, 3))
            .expect("create should succeed");

        let updated = svc
            .update_product_details(
                &ctx(),
                created.id,
                ProductDetails {
                    name: "gadget".to_string(),
                    description: None,
                    price: 650,
                },
            )
            .expect("update should succeed");

        assert_eq!(updated.name, "gadget");
        assert_eq!(updated.price, 650);
        assert_eq!(updated.description, None);
        assert_eq!(updated.stock, 3);
    }

    #[test]
    fn update_missing_product_is_not_found() {
        let (_store, svc) = service();

        let err = svc
            .update_product_details(
                &ctx(),
                3,
                ProductDetails {
                    name: "gadget".to_string(),
                    description: None,
                    price: 650,
                },
            )
            .expect_err("no such product");

        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn delete_product_removes_it() {
        let (_store, svc) = service();
        let created = svc
            .create_product(&ctx(), new_product("widget", 500, 3))
            .expect("create should succeed");

        svc.delete_product(&ctx(), created.id)
            .expect("delete should succeed");

        assert!(matches!(
            svc.find_product(&ctx(), created.id),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_missing_product_is_not_found() {
        let (_store, svc) = service();

        let err = svc.delete_product(&ctx(), 12).expect_err("no such product");

        assert!(matches!(err, DomainError::NotFound { resource: "Product", .. }));
    }
}
