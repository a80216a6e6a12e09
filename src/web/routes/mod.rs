use crate::{
    Config,
    web::{AppState, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod courses;
pub mod dashboard;
pub mod lessons;
pub mod user;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PaginationQuery {
    pub limit: i64,
    pub offset: i64,
}

pub fn build_app(state: AppState, config: &'static Config) -> Router {
    let mut router = Router::new()
        .nest("/api/v1/account/", user::routes(state.clone()))
        .nest("/api/v1/courses/", courses::routes(state.clone()))
        .nest("/api/v1/lessons/", lessons::routes(state.clone()))
        .nest("/api/v1/dashboard/", dashboard::routes(state.clone()))
        .nest_service("/api/v1/static/", ServeDir::new("uploads"))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}
