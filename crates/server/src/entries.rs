//! Entry endpoints

use api_types::entry::{
    EntryCreated, EntryListQuery, EntryListResponse, EntryNew, EntryTransfer, EntryUpdate,
    EntryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{entry_view, parse_direction},
    server::{Caller, ServerState},
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<EntryCreated>), ServerError> {
    let mut cmd = engine::AddEntryCmd::new(
        business_id,
        payload.book_id,
        caller.0,
        parse_direction(payload.direction),
        payload.amount_minor,
        payload.occurred_at.with_timezone(&Utc),
    );
    cmd.counterparty_id = payload.counterparty_id;
    cmd.remark = payload.remark;
    cmd.category = payload.category;
    cmd.payment_mode = payload.payment_mode;

    let id = state.engine.add_entry(cmd).await?;
    Ok((StatusCode::CREATED, Json(EntryCreated { id })))
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<EntryListQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let filter = engine::EntryListFilter {
        book_id: query.book_id,
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        direction: query.direction.map(parse_direction),
        counterparty_id: query.counterparty_id,
    };

    let page = state
        .engine
        .list_entries(
            business_id,
            &caller.0,
            &filter,
            limit,
            query.cursor.as_deref(),
        )
        .await?;

    Ok(Json(EntryListResponse {
        entries: page.entries.into_iter().map(entry_view).collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state
        .engine
        .entry(business_id, entry_id, &caller.0)
        .await?;
    Ok(Json(entry_view(entry)))
}

pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<EntryView>, ServerError> {
    let mut cmd = engine::UpdateEntryCmd::new(business_id, entry_id, caller.0);
    cmd.direction = payload.direction.map(parse_direction);
    cmd.amount_minor = payload.amount_minor;
    cmd.occurred_at = payload.occurred_at.map(|dt| dt.with_timezone(&Utc));
    cmd.counterparty_id = match (payload.counterparty_id, payload.clear_counterparty) {
        (Some(_), true) => {
            return Err(ServerError::Generic(
                "counterparty_id and clear_counterparty are mutually exclusive".to_string(),
            ));
        }
        (Some(id), false) => Some(Some(id)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    cmd.remark = payload.remark;
    cmd.category = payload.category;
    cmd.payment_mode = payload.payment_mode;
    cmd.expected_version = payload.expected_version;

    let entry = state.engine.update_entry(cmd).await?;
    Ok(Json(entry_view(entry)))
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_entry(business_id, entry_id, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, entry_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EntryTransfer>,
) -> Result<Json<EntryCreated>, ServerError> {
    let id = state
        .engine
        .transfer_entry(business_id, entry_id, payload.target_book_id, &caller.0)
        .await?;
    Ok(Json(EntryCreated { id }))
}
