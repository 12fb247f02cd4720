pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool, DbSetupError};
pub use handlers::AppState;

use errors::AppError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::list_customer_orders,
        handlers::orders::delete_order,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::OrderItemRequest,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderWithItemsResponse,
        handlers::products::CreateProductRequest,
        handlers::products::UpdateProductRequest,
        handlers::products::ProductResponse,
    )),
    tags(
        (name = "orders", description = "Order placement and lookup"),
        (name = "products", description = "Product catalog"),
        (name = "health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DbSetupError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(DbSetupError::Migrations)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Build and return an actix-web `Server` bound to the configured host and
/// port.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: &AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, config.request_timeout));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                log::debug!("Rejected request body: {}", err);
                AppError::BadRequest("invalid request body".to_string()).into()
            }))
            .wrap(Logger::default())
            .route("/health", web::get().to(handlers::health::health))
            .service(
                web::scope("/products")
                    .app_data(web::PathConfig::default().error_handler(|_, _| {
                        AppError::BadRequest("invalid product ID".to_string()).into()
                    }))
                    .route("", web::post().to(handlers::products::create_product))
                    .route("", web::get().to(handlers::products::list_products))
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route("/{id}", web::put().to(handlers::products::update_product))
                    .route("/{id}", web::delete().to(handlers::products::delete_product)),
            )
            .service(
                web::scope("/orders")
                    .app_data(web::PathConfig::default().error_handler(|_, _| {
                        AppError::BadRequest("invalid order ID".to_string()).into()
                    }))
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route(
                        "/customer/{customer_ref}",
                        web::get().to(handlers::orders::list_customer_orders),
                    )
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}", web::delete().to(handlers::orders::delete_order)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
