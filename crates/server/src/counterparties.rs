//! Customer and vendor endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::counterparty::{
    CounterpartiesResponse, CounterpartyCreated, CounterpartyNew, CounterpartyQuery,
    CounterpartyUpdate, CounterpartyView,
};

use crate::{
    ServerError,
    convert::{counterparty_view, parse_kind},
    server::{Caller, ServerState},
};

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CounterpartyNew>,
) -> Result<(StatusCode, Json<CounterpartyCreated>), ServerError> {
    let id = state
        .engine
        .create_counterparty(
            business_id,
            &payload.name,
            parse_kind(payload.kind),
            payload.phone.as_deref(),
            &caller.0,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CounterpartyCreated { id })))
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<CounterpartyQuery>,
) -> Result<Json<CounterpartiesResponse>, ServerError> {
    let counterparties = state
        .engine
        .list_counterparties(business_id, query.kind.map(parse_kind), &caller.0)
        .await?
        .into_iter()
        .map(counterparty_view)
        .collect();
    Ok(Json(CounterpartiesResponse { counterparties }))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, counterparty_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CounterpartyView>, ServerError> {
    let counterparty = state
        .engine
        .counterparty(business_id, counterparty_id, &caller.0)
        .await?;
    Ok(Json(counterparty_view(counterparty)))
}

pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, counterparty_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CounterpartyUpdate>,
) -> Result<Json<CounterpartyView>, ServerError> {
    let counterparty = state
        .engine
        .update_counterparty(
            business_id,
            counterparty_id,
            payload.name.as_deref(),
            payload.phone.as_deref(),
            &caller.0,
        )
        .await?;
    Ok(Json(counterparty_view(counterparty)))
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, counterparty_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_counterparty(business_id, counterparty_id, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
