use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{LedgerEvent, Notifier, ResultEngine, events};

/// Run a block inside a DB transaction, committing on success.
///
/// `?` inside the block returns early from the enclosing function; the
/// dropped transaction is rolled back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                $tx.rollback().await?;
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

mod access;
mod balances;
mod books;
mod businesses;
mod counterparties;
mod entries;
mod list;
mod memberships;

pub use list::{EntryListFilter, EntryPage};

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Handle to the ledger.
///
/// Cheap to clone: clones share the database pool, the change feed and the
/// notifier.
#[derive(Clone)]
pub struct Engine {
    database: DatabaseConnection,
    events: broadcast::Sender<LedgerEvent>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .field("subscribers", &self.events.receiver_count())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Subscribes to the change feed.
    ///
    /// Receivers only see events committed after they subscribed. A receiver
    /// that falls behind by more than the configured capacity gets
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Publishes a committed change and starts the notification fan-out.
    fn publish(&self, event: LedgerEvent) {
        tracing::debug!(
            business_id = %event.business_id,
            actor = %event.actor,
            kind = ?event.kind,
            "ledger event"
        );
        // Err only means nobody is subscribed.
        let _ = self.events.send(event.clone());

        let Some(notifier) = &self.notifier else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(events::fan_out(
                    self.database.clone(),
                    Arc::clone(notifier),
                    event,
                ));
            }
            Err(_) => tracing::warn!("no async runtime, notification fan-out skipped"),
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
    event_capacity: Option<usize>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Deliver notifications to business members through `notifier`.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Buffer size of the change feed.
    pub fn event_capacity(mut self, capacity: usize) -> EngineBuilder {
        self.event_capacity = Some(capacity);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let capacity = self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY).max(1);
        let (events, _) = broadcast::channel(capacity);
        Ok(Engine {
            database: self.database,
            events,
            notifier: self.notifier,
        })
    }
}
