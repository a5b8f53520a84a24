/// REST API v1
///
/// Identity routes are thin proxies to the identity service over gRPC.
/// Course, lesson and task routes are guarded here and forwarded over HTTP
/// to the service that owns them.
///
/// | Route                                   | Guard           |
/// |-----------------------------------------|-----------------|
/// | /api/v1/auth/*                          | none            |
/// | GET /api/v1/users/me                    | Authenticate    |
/// | POST /api/v1/courses, /courses/enroll   | Authenticate    |
/// | /courses/update, /delete, /expel        | Teacher         |
/// | /lessons/list, /tasks/list, /submit     | Member          |
/// | /lessons|tasks/create, /update, /delete | Teacher         |
/// | /api/v1/admin/**                        | Superuser       |
pub mod auth;
pub mod models;
pub mod users;

use crate::authz::Gatekeeper;
use crate::error::GatewayError;
use crate::middleware::{Authenticate, RequireCapability};
use crate::proxy::{forward_courses, forward_lessons, forward_tasks};
use actix_web::{web, HttpResponse};
use jwt_security::JwtKeys;
use std::sync::Arc;

const WRITE_ACTIONS: [&str; 3] = ["/create", "/update", "/delete"];

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, keys: JwtKeys, gatekeeper: Arc<Gatekeeper>) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        GatewayError::BadRequest(err.to_string()).into()
    }))
    .route("/health", web::get().to(health))
    .service(
        web::scope("/api/v1/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .route("/refresh", web::post().to(auth::refresh))
            .route("/logout", web::post().to(auth::logout)),
    )
    .service(
        web::scope("/api/v1/users")
            .wrap(Authenticate::new(keys.clone()))
            .route("/me", web::get().to(users::me)),
    )
    .service(
        web::scope("/api/v1/courses")
            .wrap(Authenticate::new(keys.clone()))
            .route("", web::post().to(forward_courses))
            .route("/enroll", web::post().to(forward_courses))
            .service(
                web::resource(["/update", "/delete", "/expel"])
                    .wrap(RequireCapability::teacher(gatekeeper.clone()))
                    .route(web::post().to(forward_courses)),
            ),
    )
    .service(
        web::scope("/api/v1/lessons")
            .wrap(Authenticate::new(keys.clone()))
            .service(
                web::resource("/list")
                    .wrap(RequireCapability::member(gatekeeper.clone()))
                    .route(web::post().to(forward_lessons)),
            )
            .service(
                web::resource(WRITE_ACTIONS)
                    .wrap(RequireCapability::teacher(gatekeeper.clone()))
                    .route(web::post().to(forward_lessons)),
            ),
    )
    .service(
        web::scope("/api/v1/tasks")
            .wrap(Authenticate::new(keys.clone()))
            .service(
                web::resource(["/list", "/submit"])
                    .wrap(RequireCapability::member(gatekeeper.clone()))
                    .route(web::post().to(forward_tasks)),
            )
            .service(
                web::resource(WRITE_ACTIONS)
                    .wrap(RequireCapability::teacher(gatekeeper.clone()))
                    .route(web::post().to(forward_tasks)),
            ),
    )
    .service(
        // Outermost wrap runs first: authenticate, then check the flag
        web::scope("/api/v1/admin")
            .wrap(RequireCapability::superuser(gatekeeper))
            .wrap(Authenticate::new(keys))
            .default_service(web::to(forward_courses)),
    );
}
