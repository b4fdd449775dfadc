use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{books, businesses, counterparties, entries, members};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Authenticated caller, inserted by the auth layer.
///
/// Authentication itself happens upstream; the server trusts `x-user-id`.
#[derive(Clone, Debug)]
pub struct Caller(pub String);

/// `TypedHeader` for the `x-user-id` header.
#[derive(Debug)]
struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

async fn auth(
    user_header: Option<TypedHeader<UserIdHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(Caller(user_id));
    Ok(next.run(request).await)
}

/// Builds the HTTP router over `engine`.
pub fn app(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route(
            "/businesses",
            post(businesses::create).get(businesses::list),
        )
        .route(
            "/businesses/{business_id}",
            get(businesses::get)
                .patch(businesses::rename)
                .delete(businesses::delete),
        )
        .route(
            "/businesses/{business_id}/recompute",
            post(businesses::recompute),
        )
        .route(
            "/businesses/{business_id}/members",
            get(members::list).post(members::upsert),
        )
        .route(
            "/businesses/{business_id}/members/{user_id}",
            axum::routing::delete(members::remove),
        )
        .route(
            "/businesses/{business_id}/books",
            get(books::list).post(books::create),
        )
        .route(
            "/businesses/{business_id}/books/{book_id}",
            get(books::get).patch(books::rename).delete(books::delete),
        )
        .route(
            "/businesses/{business_id}/counterparties",
            get(counterparties::list).post(counterparties::create),
        )
        .route(
            "/businesses/{business_id}/counterparties/{counterparty_id}",
            get(counterparties::get)
                .patch(counterparties::update)
                .delete(counterparties::delete),
        )
        .route(
            "/businesses/{business_id}/entries",
            get(entries::list).post(entries::create),
        )
        .route(
            "/businesses/{business_id}/entries/{entry_id}",
            get(entries::get)
                .patch(entries::update)
                .delete(entries::delete),
        )
        .route(
            "/businesses/{business_id}/entries/{entry_id}/transfer",
            post(entries::transfer),
        )
        .route_layer(middleware::from_fn(auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
