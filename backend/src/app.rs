use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    docs::ApiDoc,
    handlers,
    middleware::{self as app_middleware, rate_limit::login_rate_limiter},
    state::AppState,
};

/// Builds the full router: public, admin-only and company-only route groups
/// behind the session layer and the shared tracing/CORS stack.
pub fn router(state: AppState) -> anyhow::Result<Router> {
    let login = post(handlers::auth::login);
    let login = match login_rate_limiter(&state.config)? {
        Some(limiter) => login.layer(limiter),
        None => login,
    };

    let public_routes = Router::new()
        .route(
            "/api/auth/login",
            get(handlers::auth::login_page).merge(login),
        )
        .route("/api/auth/csrf", get(handlers::auth::csrf_token))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/register",
            post(handlers::registration::register_company),
        )
        .route("/api/directory", get(handlers::directory::list_directory))
        .route(
            "/api/directory/filters",
            get(handlers::directory::directory_filters),
        );

    let admin_routes = Router::new()
        .route(
            "/api/admin/dashboard",
            get(handlers::admin::admin_dashboard),
        )
        .route(
            "/api/admin/companies",
            get(handlers::admin::list_companies),
        )
        .route(
            "/api/admin/companies/{id}/approve",
            post(handlers::admin::approve_company),
        )
        .route(
            "/api/admin/companies/{id}/reject",
            post(handlers::admin::reject_company),
        )
        .route(
            "/api/admin/companies/{id}/toggle-active",
            post(handlers::admin::toggle_company_active),
        )
        .route(
            "/api/admin/companies/{id}/toggle-featured",
            post(handlers::admin::toggle_company_featured),
        )
        .route(
            "/api/admin/companies/{id}/extend-subscription",
            post(handlers::admin::extend_company_subscription),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::require_admin,
        ));

    let manager_routes = Router::new()
        .route(
            "/api/manager/dashboard",
            get(handlers::manager::manager_dashboard),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::require_company,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(manager_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::load_session,
        ))
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state);

    Ok(app)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}
