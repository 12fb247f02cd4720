use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{run_blocking, AppState};
use crate::domain::order::{LineItem, Order, OrderDetails, OrderItem};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Opaque identifier of the buyer. Must not be empty.
    #[serde(default)]
    pub customer_ref: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_ref: String,
    /// Smallest currency unit.
    pub total_price: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItemsResponse {
    pub order: OrderResponse,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id,
            customer_ref: o.customer_ref,
            total_price: o.total_price,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        OrderItemResponse {
            id: i.id,
            order_id: i.order_id,
            product_id: i.product_id,
            quantity: i.quantity,
            unit_price: i.unit_price,
        }
    }
}

impl From<OrderDetails> for OrderWithItemsResponse {
    fn from(d: OrderDetails) -> Self {
        OrderWithItemsResponse {
            order: d.order.into(),
            order_items: d.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order. The order, its items and the stock decrements are
/// committed together or not at all.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderWithItemsResponse),
        (status = 400, description = "Invalid request or insufficient stock"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Request cancelled or timed out"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items: Vec<LineItem> = body
        .items
        .iter()
        .map(|i| LineItem {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let placed = run_blocking(state, move |state, ctx| {
        state.orders.place_order(ctx, &body.customer_ref, &items)
    })
    .await?;

    Ok(HttpResponse::Created().json(OrderWithItemsResponse::from(placed)))
}

/// GET /orders
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders, newest first", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let orders = run_blocking(state, |state, ctx| state.orders.get_all_orders(ctx)).await?;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderWithItemsResponse),
        (status = 400, description = "Invalid order ID"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let details = run_blocking(state, move |state, ctx| state.orders.get_order(ctx, id)).await?;

    Ok(HttpResponse::Ok().json(OrderWithItemsResponse::from(details)))
}

/// GET /orders/customer/{customer_ref}
///
/// A customer without orders gets an empty list.
#[utoipa::path(
    get,
    path = "/orders/customer/{customer_ref}",
    params(
        ("customer_ref" = String, Path, description = "Customer reference"),
    ),
    responses(
        (status = 200, description = "Orders of the customer, newest first", body = [OrderResponse]),
        (status = 400, description = "Empty customer reference"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_customer_orders(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer_ref = path.into_inner();

    let orders = run_blocking(state, move |state, ctx| {
        state.orders.get_orders_by_customer_ref(ctx, &customer_ref)
    })
    .await?;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order ID"),
    ),
    responses(
        (status = 204, description = "Order and its items deleted"),
        (status = 400, description = "Invalid order ID"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    run_blocking(state, move |state, ctx| state.orders.delete_order(ctx, id)).await?;

    Ok(HttpResponse::NoContent().finish())
}
