mod config;
mod controller;
mod refresh;
mod routes;
mod scene;
mod source;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use formats::feed::FeedKind;
use runtime::Dashboard;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::controller::Controller;
use crate::refresh::Refresher;
use crate::routes::AppState;
use crate::source::HttpFeedSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Args::parse().into_config()?;
    let source = HttpFeedSource::new(
        config.stations_url.clone(),
        config.firms_url.clone(),
        config.request_timeout,
    )?;

    let dashboard = Dashboard::new(config.variable, config.toggles, config.display_offset);
    let (controller, controller_task) = Controller::spawn(dashboard, Arc::new(source));

    let refreshers: Vec<Refresher> = FeedKind::ALL
        .into_iter()
        .map(|feed| Refresher::spawn(feed, config.refresh_interval, controller.commands()))
        .collect();
    for refresher in &refreshers {
        info!(
            feed = %refresher.feed(),
            every_secs = config.refresh_interval.as_secs(),
            "polling feed"
        );
    }

    let state = AppState {
        controller,
        cluster: config.cluster,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let app = Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/scene", get(routes::get_scene))
        .route("/scene/stations", get(routes::get_station_clusters))
        .route("/status", get(routes::get_status))
        .route("/encoding/:name", get(routes::get_encoding))
        .route("/variable/:name", post(routes::set_variable))
        .route("/toggles/:name", post(routes::set_toggle))
        .route("/institution", post(routes::set_institution))
        .route("/refresh", post(routes::refresh))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("dashboard listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    drop(refreshers);
    controller_task.abort();
    Ok(())
}
