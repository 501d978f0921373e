//! Axum HTTP server for the wallet gateway.
//!
//! Public routes: health, intent extraction and price lookup. Chat and wallet
//! routes sit behind bearer auth.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderValue, StatusCode, header},
    middleware,
    routing::{delete, get, post},
};
use tokio::sync::oneshot;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::dispatcher::PRICE_NOT_FOUND;
use crate::agent::{Agent, AgentReply, Intent};
use crate::channels::web::auth::{AuthState, auth_middleware};
use crate::channels::web::types::*;
use crate::error::{ChannelError, WalletError};
use crate::tools::{PriceFeed, fill_usd_values, format_usd};
use crate::wallet::{WalletOverview, WalletService, validate_address_input};

/// Sliding-window rate limiter.
///
/// Single-user gateway with auth, so the window is global rather than per-IP.
pub struct RateLimiter {
    remaining: AtomicU64,
    /// Epoch second when the current window started.
    window_start: AtomicU64,
    max_requests: u64,
    window_secs: u64,
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl RateLimiter {
    pub fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            remaining: AtomicU64::new(max_requests),
            window_start: AtomicU64::new(epoch_secs()),
            max_requests,
            window_secs,
        }
    }

    /// Consume one request. `false` when the window is exhausted.
    pub fn check(&self) -> bool {
        let now = epoch_secs();
        let window = self.window_start.load(Ordering::Relaxed);
        if now.saturating_sub(window) >= self.window_secs {
            self.window_start.store(now, Ordering::Relaxed);
            self.remaining
                .store(self.max_requests.saturating_sub(1), Ordering::Relaxed);
            return self.max_requests > 0;
        }

        loop {
            let current = self.remaining.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .remaining
                .compare_exchange_weak(current, current - 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}

/// Shared state for all gateway handlers.
pub struct GatewayState {
    pub agent: Arc<Agent>,
    pub wallet: Arc<WalletService>,
    pub prices: Arc<dyn PriceFeed>,
    /// Chat messages per 60 seconds.
    pub chat_rate_limiter: RateLimiter,
    pub shutdown_tx: tokio::sync::RwLock<Option<oneshot::Sender<()>>>,
}

impl GatewayState {
    pub fn new(
        agent: Arc<Agent>,
        wallet: Arc<WalletService>,
        prices: Arc<dyn PriceFeed>,
        chat_rate_limit: u64,
    ) -> Self {
        Self {
            agent,
            wallet,
            prices,
            chat_rate_limiter: RateLimiter::new(chat_rate_limit, 60),
            shutdown_tx: tokio::sync::RwLock::new(None),
        }
    }

    /// Signal the server task to stop accepting connections.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.write().await.take() {
            let _ = tx.send(());
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

fn wallet_error(e: WalletError) -> ApiError {
    let status = match &e {
        WalletError::InvalidAddress { .. }
        | WalletError::InvalidAmount { .. }
        | WalletError::UnknownToken(_) => StatusCode::BAD_REQUEST,
        WalletError::NotInitialized => StatusCode::CONFLICT,
        WalletError::SignerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::error!("Wallet request failed: {}", e);
    }
    api_error(status, e.to_string())
}

fn validated(input: &str) -> Result<(), ApiError> {
    validate_address_input(input).map(|_| ()).map_err(wallet_error)
}

/// Start the gateway HTTP server.
///
/// Returns the actual bound `SocketAddr` (useful when binding to port 0).
pub async fn start_server(
    addr: SocketAddr,
    state: Arc<GatewayState>,
    auth_token: String,
) -> Result<SocketAddr, ChannelError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: format!("Failed to bind to {}: {}", addr, e),
        })?;
    let bound_addr = listener
        .local_addr()
        .map_err(|e| ChannelError::StartupFailed {
            name: "gateway".to_string(),
            reason: format!("Failed to get local addr: {}", e),
        })?;

    let auth_state = AuthState { token: auth_token };

    let public = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/ai-intent", post(ai_intent_handler))
        .route("/api/price/{token}", get(price_handler));

    let protected = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/wallet", get(wallet_handler))
        .route("/api/wallet/connect", post(wallet_connect_handler))
        .route(
            "/api/wallet/guardians",
            get(guardians_list_handler).post(guardians_add_handler),
        )
        .route(
            "/api/wallet/guardians/{address}",
            delete(guardians_remove_handler),
        )
        .route(
            "/api/wallet/recovery/initiate",
            post(recovery_initiate_handler),
        )
        .route("/api/wallet/recovery/confirm", post(recovery_confirm_handler))
        .route("/api/wallet/recovery/execute", post(recovery_execute_handler))
        .route("/api/wallet/recovery/cancel", post(recovery_cancel_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    // Local-first service: only same-host origins.
    let origins: Vec<HeaderValue> = [
        format!("http://{}:{}", bound_addr.ip(), bound_addr.port()),
        format!("http://localhost:{}", bound_addr.port()),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]));

    let app = Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    *state.shutdown_tx.write().await = Some(shutdown_tx);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Web gateway shutting down");
            })
            .await
        {
            tracing::error!("Web gateway server error: {}", e);
        }
    });

    tracing::info!("Web gateway listening on http://{}", bound_addr);
    Ok(bound_addr)
}

// --- Health ---

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        channel: "gateway",
    })
}

// --- Intent / chat ---

async fn ai_intent_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<Intent>, ApiError> {
    match state.agent.parser().parse_remote(&req.user_message).await {
        Ok(intent) => Ok(Json(intent)),
        Err(e) => {
            tracing::error!("AI intent parsing failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to parse intent",
            ))
        }
    }
}

async fn chat_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    if !state.chat_rate_limiter.check() {
        return Err(api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Try again shortly.",
        ));
    }
    let message = req.message.trim();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }
    Ok(Json(state.agent.handle_message(message).await))
}

// --- Wallet ---

async fn wallet_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<WalletOverview>, ApiError> {
    let mut overview = state.wallet.overview().await.map_err(wallet_error)?;
    fill_usd_values(state.prices.as_ref(), &mut overview.balances).await;
    Ok(Json(overview))
}

async fn wallet_connect_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let signer = state.wallet.connect().await.map_err(wallet_error)?;
    let smart_wallet = state
        .wallet
        .smart_wallet_address()
        .await
        .ok_or_else(|| wallet_error(WalletError::NotInitialized))?;
    Ok(Json(ConnectResponse {
        signer,
        smart_wallet,
    }))
}

async fn guardians_list_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<GuardiansResponse>, ApiError> {
    let guardians = state.wallet.guardians().await.map_err(wallet_error)?;
    let count = state.wallet.guardian_count().await.map_err(wallet_error)?;
    Ok(Json(GuardiansResponse {
        guardians,
        count: count.to_string(),
    }))
}

async fn guardians_add_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<GuardianRequest>,
) -> Result<Json<TxResponse>, ApiError> {
    validated(&req.address)?;
    let tx_hash = state
        .wallet
        .add_guardian(&req.address)
        .await
        .map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

async fn guardians_remove_handler(
    State(state): State<Arc<GatewayState>>,
    Path(address): Path<String>,
) -> Result<Json<TxResponse>, ApiError> {
    validated(&address)?;
    let tx_hash = state
        .wallet
        .remove_guardian(&address)
        .await
        .map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

async fn recovery_initiate_handler(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<InitiateRecoveryRequest>,
) -> Result<Json<TxResponse>, ApiError> {
    validated(&req.new_owner)?;
    let tx_hash = state
        .wallet
        .initiate_recovery(&req.new_owner)
        .await
        .map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

async fn recovery_confirm_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<TxResponse>, ApiError> {
    let tx_hash = state.wallet.confirm_recovery().await.map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

async fn recovery_execute_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<TxResponse>, ApiError> {
    let tx_hash = state.wallet.execute_recovery().await.map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

async fn recovery_cancel_handler(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<TxResponse>, ApiError> {
    let tx_hash = state.wallet.cancel_recovery().await.map_err(wallet_error)?;
    Ok(Json(TxResponse { tx_hash }))
}

// --- Price ---

async fn price_handler(
    State(state): State<Arc<GatewayState>>,
    Path(token): Path<String>,
) -> Result<Json<PriceResponse>, ApiError> {
    let usd = state.prices.usd_price(&token).await.map_err(|e| {
        tracing::warn!(token = %token, "Price lookup failed: {}", e);
        api_error(StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    let display = usd
        .map(format_usd)
        .unwrap_or_else(|| PRICE_NOT_FOUND.to_string());
    Ok(Json(PriceResponse {
        token,
        usd,
        display,
    }))
}
