//! Membership endpoints. Changes are owner-only; members may remove
//! themselves.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::membership::{MemberUpsert, MembersResponse};

use crate::{
    ServerError,
    convert::{member_view, parse_role},
    server::{Caller, ServerState},
};

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state
        .engine
        .list_members(business_id, &caller.0)
        .await?
        .into_iter()
        .map(member_view)
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn upsert(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<MemberUpsert>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .upsert_member(
            business_id,
            &payload.user_id,
            parse_role(payload.role),
            &caller.0,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, user_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(business_id, &user_id, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
