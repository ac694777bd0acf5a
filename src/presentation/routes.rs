use crate::presentation::handlers::{
    create_user, delete_user, get_user, health_check, json_config, list_users, update_user,
};
use actix_web::web;

pub const ROUTES: &str = "GET /api/health, GET /api/users, POST /api/users, \
    GET /api/users/{id}, PUT /api/users/{id}, DELETE /api/users/{id}";

/// Mounts the API under `/api`. The app-level 404 fallback
/// (`handlers::route_not_found`) is installed by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/users")
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("/{id}", web::get().to(get_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user)),
            ),
    );
}
