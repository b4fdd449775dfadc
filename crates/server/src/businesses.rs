//! Business endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::business::{
    BusinessCreated, BusinessNew, BusinessRename, BusinessView, BusinessesResponse, Recomputed,
};

use crate::{
    ServerError,
    convert::{business_view, parse_currency},
    server::{Caller, ServerState},
};

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<BusinessNew>,
) -> Result<(StatusCode, Json<BusinessCreated>), ServerError> {
    let currency = parse_currency(payload.currency.unwrap_or_default());
    let id = state
        .engine
        .create_business(&payload.name, currency, &caller.0)
        .await?;
    Ok((StatusCode::CREATED, Json(BusinessCreated { id })))
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<BusinessesResponse>, ServerError> {
    let businesses = state
        .engine
        .list_businesses(&caller.0)
        .await?
        .into_iter()
        .map(|(business, role)| business_view(business, Some(role)))
        .collect();

    Ok(Json(BusinessesResponse { businesses }))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<BusinessView>, ServerError> {
    let business = state.engine.business(business_id, &caller.0).await?;
    let role = state.engine.role(business_id, &caller.0).await?;
    Ok(Json(business_view(business, role)))
}

pub async fn rename(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<BusinessRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_business(business_id, &payload.name, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_business(business_id, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recompute(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<Recomputed>, ServerError> {
    let corrected = state
        .engine
        .recompute_aggregates(business_id, &caller.0)
        .await?;
    Ok(Json(Recomputed { corrected }))
}
