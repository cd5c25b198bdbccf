use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::{sync::Arc, time::Duration};

use crate::{ServerError, form, prices, trips};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

/// Identity and form session options.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Owner used when a request carries no `x-user-id`. `None` disables
    /// anonymous sessions.
    pub anonymous_user: Option<String>,
    /// Form sessions untouched for this long are dropped.
    pub session_idle: Duration,
    /// Upper bound on live form sessions.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            anonymous_user: None,
            session_idle: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub forms: Arc<form::FormSessions>,
    pub config: Arc<ServerConfig>,
}

/// `TypedHeader` for the caller identity.
///
/// Supplied by the identity provider in front of this service.
#[derive(Debug)]
struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

/// Owner of the current request, if any.
#[derive(Clone, Debug)]
pub struct Identity(Option<String>);

impl Identity {
    pub(crate) fn user_id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub(crate) fn require(&self) -> Result<&str, ServerError> {
        self.user_id()
            .ok_or_else(|| ServerError::Unauthorized("no user identity".to_string()))
    }

    /// Key of the form session. Requests without identity share one session.
    pub(crate) fn session_key(&self) -> String {
        self.0.clone().unwrap_or_default()
    }
}

async fn identify(
    user_header: Option<TypedHeader<UserIdHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match user_header {
        Some(TypedHeader(UserIdHeader(user_id))) => Some(user_id),
        None => state.config.anonymous_user.clone(),
    };

    request.extensions_mut().insert(Identity(user_id));
    next.run(request).await
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/prices/{region}", get(prices::get))
        .route("/form", get(form::get))
        .route("/form/mode", put(form::set_mode))
        .route("/form/trip", patch(form::patch_trip))
        .route("/form/daily", patch(form::patch_daily))
        .route("/form/monthly", patch(form::patch_monthly))
        .route("/form/submit", post(form::submit))
        .route("/trips", get(trips::list).delete(trips::clear))
        .route("/trips/live", get(trips::live))
        .route_layer(middleware::from_fn_with_state(state.clone(), identify))
        .with_state(state)
}

/// Build the application router around an already constructed engine.
pub fn app(engine: Arc<Engine>, config: ServerConfig) -> Router {
    let forms = Arc::new(form::FormSessions::new(
        *engine.prices(),
        config.session_idle,
        config.max_sessions,
    ));
    router(ServerState {
        engine,
        forms,
        config: Arc::new(config),
    })
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(Arc::new(engine), config)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
