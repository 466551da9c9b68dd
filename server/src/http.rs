use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRef, Path, Request, State, rejection::JsonRejection},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use platform_api::{ApiError, ApiResult, MessageBody};
use platform_authn::{LoginRequest, SessionId, SessionRegistry};
use products_hr::{
    DeletedEmployee, EMPLOYEE_DELETED, EMPLOYEE_NOT_FOUND, Employee, EmployeeId, EmployeeInput,
    EmployeeStore, HrError,
};
use serde::Serialize;
use time::Duration as TimeDuration;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, instrument};

use crate::config::AppConfig;

const SESSION_COOKIE: &str = "directory_session";

/// Everything a handler can reach. Built once in `main`; no globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<EmployeeStore>>,
    pub sessions: Arc<RwLock<SessionRegistry>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: EmployeeStore) -> Self {
        let sessions = SessionRegistry::new(config.admin.clone(), config.session_ttl);
        Self {
            store: Arc::new(RwLock::new(store)),
            sessions: Arc::new(RwLock::new(sessions)),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.config.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "directory server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let layer = CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);
    // Cookies only cross origins that were named explicitly.
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(allowed))
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");

    let employees: Router<AppState> = Router::new()
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/{id}",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .merge(employees);
    if let Some(dir) = &state.config.public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

fn session_id(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()))
}

/// Session gate in front of every `/api/employees` route.
async fn require_login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let authenticated = match session_id(&jar) {
        Some(id) => state.sessions.write().await.is_authenticated(id),
        None => false,
    };
    if !authenticated {
        return Err(ApiError::unauthorized());
    }
    Ok(next.run(request).await)
}

#[instrument(name = "http.login", skip_all)]
async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(PrivateCookieJar, Json<MessageBody>)> {
    let Json(body) = payload.map_err(json_error)?;
    let mut sessions = state.sessions.write().await;
    let id = sessions
        .login(&body.email, &body.password)
        .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
    // A rejected attempt leaves any live session in place.
    if let Some(previous) = session_id(&jar) {
        sessions.logout(previous);
    }

    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(state.config.session_ttl.num_seconds()))
        .build();
    Ok((jar.add(cookie), Json(MessageBody::new("Login successful"))))
}

#[instrument(name = "http.logout", skip_all)]
async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Json<MessageBody>) {
    if let Some(id) = session_id(&jar) {
        state.sessions.write().await.logout(id);
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (jar, Json(MessageBody::new("Logged out")))
}

#[instrument(name = "http.employees.list", skip_all)]
async fn list_employees(State(state): State<AppState>) -> Json<Vec<Employee>> {
    Json(state.store.read().await.list().to_vec())
}

#[instrument(name = "http.employees.get", skip_all)]
async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    let id = parse_id(&id)?;
    let store = state.store.read().await;
    store.get(id).cloned().map(Json).map_err(hr_error)
}

#[instrument(name = "http.employees.create", skip_all)]
async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let Json(input) = payload.map_err(json_error)?;
    let employee = state.store.write().await.create(input).map_err(hr_error)?;
    info!(id = employee.id, "employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

#[instrument(name = "http.employees.update", skip_all)]
async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EmployeeInput>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(json_error)?;
    let employee = state
        .store
        .write()
        .await
        .update(id, input)
        .map_err(hr_error)?;
    info!(id, "employee updated");
    Ok(Json(employee))
}

#[instrument(name = "http.employees.delete", skip_all)]
async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedEmployee>> {
    let id = parse_id(&id)?;
    let employee = state.store.write().await.delete(id).map_err(hr_error)?;
    info!(id, "employee deleted");
    Ok(Json(DeletedEmployee {
        message: EMPLOYEE_DELETED.into(),
        employee,
    }))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Served without a session, so it carries nothing about the records.
#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

/// Ids that are not integers cannot name a record.
fn parse_id(raw: &str) -> ApiResult<EmployeeId> {
    raw.trim()
        .parse::<EmployeeId>()
        .map_err(|_| ApiError::not_found(EMPLOYEE_NOT_FOUND))
}

fn hr_error(err: HrError) -> ApiError {
    match err {
        HrError::Validation(message) => ApiError::InvalidInput(message),
        HrError::NotFound(_) => ApiError::not_found(EMPLOYEE_NOT_FOUND),
    }
}

fn json_error(rejection: JsonRejection) -> ApiError {
    ApiError::invalid(rejection.body_text())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
