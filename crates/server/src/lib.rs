use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{Caller, app, run, run_with_listener, spawn_with_listener};

mod books;
mod businesses;
mod convert;
mod counterparties;
mod entries;
mod members;
mod server;

pub mod types {
    pub mod business {
        pub use api_types::business::{
            BusinessCreated, BusinessNew, BusinessRename, BusinessView, BusinessesResponse,
            Recomputed,
        };
    }

    pub mod membership {
        pub use api_types::membership::{MemberUpsert, MemberView, MembersResponse, Role};
    }

    pub mod book {
        pub use api_types::book::{
            BookCreated, BookDeleted, BookNew, BookRename, BookView, BooksResponse,
        };
    }

    pub mod counterparty {
        pub use api_types::counterparty::{
            CounterpartiesResponse, CounterpartyCreated, CounterpartyKind, CounterpartyNew,
            CounterpartyQuery, CounterpartyUpdate, CounterpartyView,
        };
    }

    pub mod entry {
        pub use api_types::entry::{
            Direction, EntryCreated, EntryListQuery, EntryListResponse, EntryNew, EntryTransfer,
            EntryUpdate, EntryView,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidDirection(_)
        | EngineError::InvalidTransfer(_)
        | EngineError::InvalidCursor(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
