use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::{record_failures, FailureRecorder, JsonLinesRecorder, NoopRecorder};
use crate::jwt::JwtConfig;
use crate::routes::{
    appointments, auth, businesses, customers, financial, goals, health, pets, public, services, users,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub config: Arc<AppConfig>,
    pub failures: Arc<dyn FailureRecorder>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, config: AppConfig) -> Self {
        let failures: Arc<dyn FailureRecorder> = match config.error_log_path.as_ref() {
            Some(path) => Arc::new(JsonLinesRecorder::new(path)),
            None => Arc::new(NoopRecorder),
        };

        Self {
            pool,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
            failures,
        }
    }

    pub fn with_failure_recorder(mut self, recorder: Arc<dyn FailureRecorder>) -> Self {
        self.failures = recorder;
        self
    }
}

/// Router built from environment configuration.
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let config = AppConfig::from_env()?;
    Ok(router(AppState::new(pool, jwt_config, config)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", put(users::update_user).delete(users::delete_user))
        .route("/businesses", get(businesses::list_businesses).post(businesses::create_business))
        .route(
            "/businesses/:id",
            get(businesses::get_business)
                .put(businesses::update_business)
                .delete(businesses::delete_business),
        );

    let customer_routes = Router::new()
        .route("/", get(customers::list_customers).post(customers::create_customer))
        .route(
            "/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        );

    let pet_routes = Router::new()
        .route("/", get(pets::list_pets).post(pets::create_pet))
        .route("/:id", get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet));

    let service_routes = Router::new()
        .route("/", get(services::list_services).post(services::create_service))
        .route(
            "/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        );

    let appointment_routes = Router::new()
        .route("/", get(appointments::list_appointments).post(appointments::create_appointment))
        .route(
            "/business/:handle",
            get(appointments::list_business_appointments).post(appointments::create_business_appointment),
        )
        .route(
            "/:id",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        );

    let financial_routes = Router::new()
        .route("/", get(financial::list_records).post(financial::create_record))
        .route("/overview", get(financial::overview))
        .route(
            "/:id",
            get(financial::get_record)
                .put(financial::update_record)
                .delete(financial::delete_record),
        );

    let goal_routes = Router::new()
        .route("/", get(goals::list_goals).post(goals::create_goal))
        .route("/progress", get(goals::progress))
        .route("/:id", get(goals::get_goal).put(goals::update_goal).delete(goals::delete_goal));

    // Unauthenticated surface used by the booking page
    let public_routes = Router::new()
        .route("/agendamentos-publicos", post(public::book_default))
        .route("/agendamentos-publicos/:handle", post(public::book_for_handle))
        .route("/business/:handle/info", get(public::business_info))
        .route("/business/:handle/services", get(public::business_services));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .nest("/customers", customer_routes)
        .nest("/pets", pet_routes)
        .nest("/services", service_routes)
        .nest("/appointments", appointment_routes)
        .nest("/financial", financial_routes)
        .nest("/goals", goal_routes)
        .merge(public_routes)
        .layer(middleware::from_fn_with_state(state.clone(), record_failures))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
