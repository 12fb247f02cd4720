use std::time::Duration;

use actix_web::web;

use crate::application::context::RequestContext;
use crate::application::order_service::OrderService;
use crate::application::product_service::ProductService;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselInventoryRepository;
use crate::infrastructure::transactor::PgTransactor;

pub mod health;
pub mod orders;
pub mod products;

pub type PgOrderService = OrderService<PgTransactor, DieselInventoryRepository, DieselOrderRepository>;
pub type PgProductService = ProductService<PgTransactor, DieselInventoryRepository>;

/// Shared per-worker state handed to every handler.
pub struct AppState {
    pub orders: PgOrderService,
    pub products: PgProductService,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pool: DbPool, request_timeout: Duration) -> Self {
        Self {
            orders: OrderService::new(
                PgTransactor::new(pool.clone()),
                DieselInventoryRepository,
                DieselOrderRepository,
            ),
            products: ProductService::new(PgTransactor::new(pool), DieselInventoryRepository),
            request_timeout,
        }
    }
}

/// Runs a blocking service call on the actix blocking pool.
///
/// The call gets a fresh [`RequestContext`] bounded by the configured
/// request timeout. If this future is dropped before the call returns (the
/// client went away), the context is cancelled so the call rolls back
/// instead of committing.
pub(crate) async fn run_blocking<T, F>(state: web::Data<AppState>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState, &RequestContext) -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    let ctx = RequestContext::with_timeout(state.request_timeout);
    let guard = ctx.cancel_on_drop();

    let result = web::block(move || f(state.get_ref(), &ctx)).await;
    guard.disarm();

    Ok(result??)
}
