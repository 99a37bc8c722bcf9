// Route exports
pub mod matches;

pub use matches::AppState;

use actix_web::web;

/// Configure all application routes under the versioned API scope
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(matches::configure));
}
