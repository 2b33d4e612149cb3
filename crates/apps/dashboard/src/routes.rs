use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formats::feed::FeedKind;
use formats::station::Variable;
use foundation::color::Color;
use layers::cluster::ClusterConfig;
use layers::symbology::{color_for_name, legend_for_name, unit_for_name, Legend};
use layers::{InstitutionFilter, StationItem, Toggle, ToggleState};
use runtime::{RefreshStats, Transition};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::controller::{ControllerClosed, ControllerHandle};
use crate::scene::SceneDocument;

const MAX_ZOOM: f64 = 22.0;

#[derive(Clone)]
pub struct AppState {
    pub controller: ControllerHandle,
    pub cluster: ClusterConfig,
}

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

fn unavailable(err: ControllerClosed) -> (StatusCode, Json<Value>) {
    api_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
}

pub async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn get_scene(State(state): State<AppState>) -> Json<SceneDocument> {
    Json(state.controller.snapshot().scene.clone())
}

#[derive(Debug, Deserialize)]
pub struct ZoomQuery {
    pub zoom: f64,
}

/// Station markers regrouped for one zoom level.
pub async fn get_station_clusters(
    State(state): State<AppState>,
    Query(query): Query<ZoomQuery>,
) -> ApiResult<Json<Vec<StationItem>>> {
    if !query.zoom.is_finite() || !(0.0..=MAX_ZOOM).contains(&query.zoom) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("zoom must be between 0 and {MAX_ZOOM}"),
        ));
    }
    let snapshot = state.controller.snapshot();
    Ok(Json(
        snapshot
            .layers
            .clustered_stations(query.zoom, &state.cluster),
    ))
}

pub async fn set_variable(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SceneDocument>> {
    let variable: Variable = name
        .parse()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{e}")))?;
    let snapshot = state
        .controller
        .apply(Transition::SetVariable(variable))
        .await
        .map_err(unavailable)?;
    Ok(Json(snapshot.scene.clone()))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub checked: bool,
}

pub async fn set_toggle(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> ApiResult<Json<SceneDocument>> {
    let toggle = Toggle::from_name(&name)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown toggle: {name}")))?;
    if state.controller.snapshot().toggles.control(toggle).is_none() {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("toggle {} is not available", toggle.name()),
        ));
    }
    let snapshot = state
        .controller
        .apply(Transition::ToggleChanged {
            toggle,
            checked: body.checked,
        })
        .await
        .map_err(unavailable)?;
    Ok(Json(snapshot.scene.clone()))
}

#[derive(Debug, Deserialize)]
pub struct InstitutionRequest {
    pub code: String,
}

pub async fn set_institution(
    State(state): State<AppState>,
    Json(body): Json<InstitutionRequest>,
) -> ApiResult<Json<SceneDocument>> {
    let snapshot = state
        .controller
        .apply(Transition::SetInstitution(InstitutionFilter::parse(&body.code)))
        .await
        .map_err(unavailable)?;
    Ok(Json(snapshot.scene.clone()))
}

#[derive(Debug, Default, Deserialize)]
pub struct EncodingQuery {
    pub value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EncodingResponse {
    pub variable: String,
    pub known: bool,
    pub unit: &'static str,
    /// Fill for `value`, when one was given.
    pub color: Option<Color>,
    pub legend: Legend,
    pub legend_html: String,
}

/// Color, unit and legend for any variable name. Names that are not a
/// known variable get the gray fallback instead of an error.
pub async fn get_encoding(
    Path(name): Path<String>,
    Query(query): Query<EncodingQuery>,
) -> Json<EncodingResponse> {
    let legend = legend_for_name(&name);
    Json(EncodingResponse {
        known: Variable::from_name(&name).is_some(),
        unit: unit_for_name(&name),
        color: query.value.map(|v| color_for_name(v, &name)),
        legend_html: legend.to_html(),
        legend,
        variable: name,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub feed: Option<String>,
}

/// Queues an out-of-band refresh of one feed, or both when none is named.
pub async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> ApiResult<impl IntoResponse> {
    let feeds: Vec<FeedKind> = match query.feed.as_deref().map(str::trim) {
        None | Some("") => FeedKind::ALL.to_vec(),
        Some(name) => {
            let feed = FeedKind::ALL
                .into_iter()
                .find(|f| f.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    api_error(StatusCode::BAD_REQUEST, format!("unknown feed: {name}"))
                })?;
            vec![feed]
        }
    };
    for feed in &feeds {
        state.controller.refresh(*feed).await.map_err(unavailable)?;
    }
    let names: Vec<&str> = feeds.iter().map(|f| f.name()).collect();
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": names }))))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub variable: Variable,
    pub toggles: ToggleState,
    pub institution: InstitutionFilter,
    pub stats: RefreshStats,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.controller.snapshot();
    Json(StatusResponse {
        variable: snapshot.variable,
        toggles: snapshot.toggles,
        institution: snapshot.institution.clone(),
        stats: snapshot.stats.clone(),
    })
}
