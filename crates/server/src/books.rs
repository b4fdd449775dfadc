//! Book endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::book::{BookCreated, BookDeleted, BookNew, BookRename, BookView, BooksResponse};

use crate::{
    ServerError,
    convert::book_view,
    server::{Caller, ServerState},
};

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<BookNew>,
) -> Result<(StatusCode, Json<BookCreated>), ServerError> {
    let id = state
        .engine
        .create_book(business_id, &payload.name, &caller.0)
        .await?;
    Ok((StatusCode::CREATED, Json(BookCreated { id })))
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<BooksResponse>, ServerError> {
    let books = state
        .engine
        .list_books(business_id, &caller.0)
        .await?
        .into_iter()
        .map(book_view)
        .collect();
    Ok(Json(BooksResponse { books }))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, book_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BookView>, ServerError> {
    let book = state.engine.book(business_id, book_id, &caller.0).await?;
    Ok(Json(book_view(book)))
}

pub async fn rename(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, book_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BookRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_book(business_id, book_id, &payload.name, &caller.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path((business_id, book_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BookDeleted>, ServerError> {
    let entries_removed = state
        .engine
        .delete_book(business_id, book_id, &caller.0)
        .await?;
    Ok(Json(BookDeleted { entries_removed }))
}
