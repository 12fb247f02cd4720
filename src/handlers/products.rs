use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{run_blocking, AppState};
use crate::domain::product::{NewProduct, Product, ProductDetails};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Smallest currency unit.
    pub price: i64,
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 409, description = "A product with this name already exists"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        name: body.name,
        description: body.description,
        price: body.price,
        stock: body.stock,
    };

    let created = run_blocking(state, move |state, ctx| {
        state.products.create_product(ctx, product)
    })
    .await?;

    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "All products", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let products = run_blocking(state, |state, ctx| state.products.list_products(ctx)).await?;

    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, description = "Invalid product ID"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = run_blocking(state, move |state, ctx| state.products.find_product(ctx, id)).await?;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PUT /products/{id}
///
/// Replaces name, description and price. Stock is left untouched.
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "A product with this name already exists"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let details = ProductDetails {
        name: body.name,
        description: body.description,
        price: body.price,
    };

    let updated = run_blocking(state, move |state, ctx| {
        state.products.update_product_details(ctx, id, details)
    })
    .await?;

    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

/// DELETE /products/{id}
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 400, description = "Invalid product ID or product still referenced by orders"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    run_blocking(state, move |state, ctx| state.products.delete_product(ctx, id)).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("product with id {} deleted", id)
    })))
}
