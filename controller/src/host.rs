use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use greenhouse_common::{
    ActuatorState, ConfigError, Configuration, FanAction, FanCommand, ENV_TIMEZONE,
};

use crate::{
    check::{CheckOutcome, FanService, OverrideOutcome},
    dispatch::ActuatorDispatcher,
    error::CheckError,
    ifttt::IftttWebhook,
    secrets::{EnvSecrets, MountedSecrets, SecretProvider},
    sensorpush::SensorPushClient,
};

#[derive(Clone)]
pub struct AppState {
    service: Arc<FanService>,
    timezone: Tz,
}

impl AppState {
    pub fn new(service: Arc<FanService>, timezone: Tz) -> Self {
        Self { service, timezone }
    }

    fn local_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Configuration::from_env().context("invalid greenhouse configuration")?;
    let timezone = parse_timezone(&config.timezone)?;

    let secrets: Arc<dyn SecretProvider> = match &config.secrets_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading secrets from mounted files");
            Arc::new(MountedSecrets::new(dir.clone()))
        }
        None => Arc::new(EnvSecrets),
    };

    let reader = SensorPushClient::new(secrets.clone(), config.upstream_timeout)
        .context("failed to build sensor client")?;
    let sink =
        IftttWebhook::new(config.upstream_timeout).context("failed to build webhook client")?;
    let dispatcher = ActuatorDispatcher::new(
        secrets,
        Arc::new(sink),
        config.events.clone(),
        config.upstream_timeout,
    );
    let service = FanService::new(&config, Arc::new(reader), dispatcher)
        .context("invalid temperature thresholds")?;

    info!(
        sensor = %config.sensor_id,
        high = config.thresholds.high_trigger,
        low = config.thresholds.low_trigger,
        "greenhouse fan controller configured"
    );

    let app = router(AppState::new(Arc::new(service), timezone));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/check-greenhouse-temp", get(handle_check))
        .route("/start-greenhouse-fans", get(handle_start_fans))
        .route("/stop-greenhouse-fans", get(handle_stop_fans))
        .route("/test-sensorpush-connection", get(handle_probe_sensor))
        .route("/status", get(handle_get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>().map_err(|_| ConfigError::Invalid {
        key: ENV_TIMEZONE,
        value: name.to_string(),
        reason: "not an IANA timezone",
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        // Without a signal handler, serve until killed.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn handle_root() -> &'static str {
    "Greenhouse fan controller is running."
}

async fn handle_check(State(state): State<AppState>) -> Response {
    match state.service.check_and_act().await {
        Ok(outcome) => check_message(&state, &outcome).into_response(),
        Err(err) => check_error_response("temperature check", err),
    }
}

async fn handle_start_fans(State(state): State<AppState>) -> Response {
    manual_override(state, FanCommand::TurnOn).await
}

async fn handle_stop_fans(State(state): State<AppState>) -> Response {
    manual_override(state, FanCommand::TurnOff).await
}

async fn manual_override(state: AppState, command: FanCommand) -> Response {
    match state.service.manual(command).await {
        Ok(outcome) => override_message(&state, &outcome).into_response(),
        Err(err) => check_error_response("manual fan override", err),
    }
}

async fn handle_probe_sensor(State(state): State<AppState>) -> Response {
    match state.service.probe_sensor().await {
        Ok(sample) => {
            let observed = sample
                .observed_at
                .map(|at| state.local_time(at))
                .unwrap_or_else(|| "an unknown time".to_string());
            format!(
                "The most recent temperature in the greenhouse is {:.1}, observed at {observed} by sensor {}.",
                sample.value, sample.sensor_id
            )
            .into_response()
        }
        Err(err) => check_error_response("sensor probe", err),
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.status().await)
}

fn check_message(state: &AppState, outcome: &CheckOutcome) -> String {
    let thresholds = state.service.thresholds();
    let value = outcome.sample.value;
    let detail = match outcome.decision.action {
        FanAction::TurnOn => format!(
            "Temperature {value:.1} is above {:.1}. Starting greenhouse fans. Fans are now {}.",
            thresholds.high_trigger,
            outcome.state.as_str()
        ),
        FanAction::TurnOff => format!(
            "Temperature {value:.1} is below {:.1}. Stopping greenhouse fans. Fans are now {}.",
            thresholds.low_trigger,
            outcome.state.as_str()
        ),
        FanAction::None => format!(
            "Temperature {value:.1}, fans remain {}. No action taken.",
            outcome.previous_state.as_str()
        ),
    };

    format!(
        "Checked greenhouse temperature at {}. {detail}",
        state.local_time(outcome.checked_at)
    )
}

fn override_message(state: &AppState, outcome: &OverrideOutcome) -> String {
    let direction = match outcome.state {
        ActuatorState::On => "on",
        ActuatorState::Off => "off",
    };
    format!(
        "The greenhouse fans should be {direction} now. Sent {} ({}) at {}; fans were {}.",
        outcome.ack.event,
        outcome.ack.command.as_str(),
        state.local_time(Utc::now()),
        outcome.previous_state.as_str()
    )
}

fn check_error_response(operation: &str, err: CheckError) -> Response {
    warn!(kind = err.kind(), "{operation} failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: format!("{operation} failed: {err}"),
            kind: err.kind(),
        }),
    )
        .into_response()
}
