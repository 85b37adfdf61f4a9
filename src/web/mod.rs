//! HTTP adapter for a browser presentation layer.
//!
//! Commands arrive as JSON on `POST /api/command`; every visible change is pushed as a
//! snapshot over server-sent events. The session sits behind a mutex, so requests are
//! applied one at a time in arrival order.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    command::Command,
    components::BuildingId,
    engine::{Outcome, Session},
    rules::RuleSet,
    snapshot::VillageSnapshot,
};

pub struct WebServerConfig {
    pub rules: RuleSet,
    pub seed: u64,
    pub host: String,
    pub port: u16,
    /// How often passive income and feedback expiry run.
    pub tick: Duration,
}

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        let (broadcaster, _) = broadcast::channel(256);
        Self {
            session: Arc::new(Mutex::new(session)),
            broadcaster,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: &VillageSnapshot) {
        match serde_json::to_string(snapshot) {
            // No subscribers is fine; the next /api/state call catches up.
            Ok(payload) => {
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!(%err, "failed to encode snapshot"),
        }
    }

    /// Advances the session clock and publishes a frame if anything changed.
    pub fn tick(&self) -> Outcome {
        let now = Utc::now();
        let (outcome, snapshot) = {
            let mut session = self.lock();
            let outcome = session.advance(now);
            let snapshot = outcome.changed.then(|| session.snapshot(now));
            (outcome, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.publish(&snapshot);
        }
        outcome
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/command", post(apply_command))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        rules,
        seed,
        host,
        port,
        tick,
    } = config;

    let rules_name = rules.name.clone();
    let state = AppState::new(Session::new(rules, seed));

    let ticker = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            ticker.tick();
        }
    });

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, rules = %rules_name, "village server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down village server");
}

async fn latest_state(State(state): State<AppState>) -> Json<VillageSnapshot> {
    Json(state.lock().snapshot(Utc::now()))
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub feedback: Option<String>,
    pub declined: Option<String>,
    pub win_dialog_opened: bool,
    pub choice: Option<Vec<BuildingId>>,
    pub snapshot: VillageSnapshot,
}

async fn apply_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<CommandResponse> {
    let now = Utc::now();
    let (outcome, snapshot) = {
        let mut session = state.lock();
        let outcome = session.apply(command, now);
        (outcome, session.snapshot(now))
    };
    if outcome.changed {
        state.publish(&snapshot);
    }
    Json(CommandResponse {
        feedback: outcome.feedback.map(|line| line.text),
        declined: outcome.declined.map(|declined| declined.to_string()),
        win_dialog_opened: outcome.win_dialog_opened,
        choice: outcome.choice,
        snapshot,
    })
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
