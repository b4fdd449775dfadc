//! Change feed and notification fan-out.
//!
//! Every committed mutation produces a [`LedgerEvent`]. Events are published
//! on a broadcast channel (see [`Engine::subscribe`]) and, when a
//! [`Notifier`] is configured, fanned out to the other members of the
//! business on a background task. Fan-out is best effort: failures are
//! logged and never reach the caller of the mutation.
//!
//! [`Engine::subscribe`]: crate::Engine::subscribe

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Currency, Direction, MoneyCents, Role, businesses, memberships};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    BusinessCreated,
    BusinessRenamed,
    BusinessDeleted,
    MemberUpserted {
        user_id: String,
        role: Role,
    },
    MemberRemoved {
        user_id: String,
    },
    BookCreated {
        book_id: Uuid,
    },
    BookRenamed {
        book_id: Uuid,
    },
    BookDeleted {
        book_id: Uuid,
        entries_removed: u64,
    },
    CounterpartyCreated {
        counterparty_id: Uuid,
    },
    CounterpartyUpdated {
        counterparty_id: Uuid,
    },
    CounterpartyDeleted {
        counterparty_id: Uuid,
    },
    EntryAdded {
        book_id: Uuid,
        entry_id: Uuid,
        direction: Direction,
        amount_minor: i64,
    },
    EntryUpdated {
        book_id: Uuid,
        entry_id: Uuid,
    },
    EntryDeleted {
        book_id: Uuid,
        entry_id: Uuid,
    },
    EntryTransferred {
        from_book_id: Uuid,
        to_book_id: Uuid,
        old_entry_id: Uuid,
        new_entry_id: Uuid,
    },
    AggregatesRecomputed {
        corrected: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub business_id: Uuid,
    /// User that performed the mutation.
    pub actor: String,
    pub at: DateTime<Utc>,
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    pub(crate) fn new(business_id: Uuid, actor: &str, kind: LedgerEventKind) -> Self {
        Self {
            business_id,
            actor: actor.to_string(),
            at: Utc::now(),
            kind,
        }
    }

    /// Short human readable description, used as notification body.
    /// Amounts are formatted in the business `currency`.
    #[must_use]
    pub fn describe(&self, currency: Currency) -> String {
        let actor = &self.actor;
        match &self.kind {
            LedgerEventKind::BusinessCreated => format!("{actor} created the business"),
            LedgerEventKind::BusinessRenamed => format!("{actor} renamed the business"),
            LedgerEventKind::BusinessDeleted => format!("{actor} deleted the business"),
            LedgerEventKind::MemberUpserted { user_id, role } => {
                format!("{actor} set {user_id} as {role}")
            }
            LedgerEventKind::MemberRemoved { user_id } => format!("{actor} removed {user_id}"),
            LedgerEventKind::BookCreated { .. } => format!("{actor} created a book"),
            LedgerEventKind::BookRenamed { .. } => format!("{actor} renamed a book"),
            LedgerEventKind::BookDeleted {
                entries_removed, ..
            } => format!("{actor} deleted a book with {entries_removed} entries"),
            LedgerEventKind::CounterpartyCreated { .. } => {
                format!("{actor} added a customer/vendor")
            }
            LedgerEventKind::CounterpartyUpdated { .. } => {
                format!("{actor} edited a customer/vendor")
            }
            LedgerEventKind::CounterpartyDeleted { .. } => {
                format!("{actor} removed a customer/vendor")
            }
            LedgerEventKind::EntryAdded {
                direction,
                amount_minor,
                ..
            } => format!(
                "{actor} added a cash {} entry of {}",
                direction.as_str(),
                MoneyCents::new(*amount_minor).format_in(currency)
            ),
            LedgerEventKind::EntryUpdated { .. } => format!("{actor} edited an entry"),
            LedgerEventKind::EntryDeleted { .. } => format!("{actor} deleted an entry"),
            LedgerEventKind::EntryTransferred { .. } => {
                format!("{actor} moved an entry to another book")
            }
            LedgerEventKind::AggregatesRecomputed { corrected } => {
                format!("{actor} recomputed totals ({corrected} corrected)")
            }
        }
    }
}

/// A message for one collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub business_id: Uuid,
    pub actor: String,
    pub message: String,
}

#[derive(Error, Debug)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery seam for notifications (push, e-mail, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notification.recipient,
            business_id = %notification.business_id,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Sends `event` to every member of its business except the actor.
pub(crate) async fn fan_out(
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
    event: LedgerEvent,
) {
    let members = match memberships::Entity::find()
        .filter(memberships::Column::BusinessId.eq(event.business_id.to_string()))
        .all(&database)
        .await
    {
        Ok(members) => members,
        Err(err) => {
            tracing::warn!(
                business_id = %event.business_id,
                "failed to resolve notification recipients: {err}"
            );
            return;
        }
    };

    let currency = match businesses::Entity::find_by_id(event.business_id.to_string())
        .one(&database)
        .await
    {
        Ok(Some(business)) => match Currency::try_from(business.currency.as_str()) {
            Ok(currency) => currency,
            Err(err) => {
                tracing::warn!(business_id = %event.business_id, "{err}");
                return;
            }
        },
        // Deleted together with its memberships: nobody left to notify.
        Ok(None) => return,
        Err(err) => {
            tracing::warn!(
                business_id = %event.business_id,
                "failed to resolve business currency: {err}"
            );
            return;
        }
    };

    let message = event.describe(currency);
    for member in members
        .into_iter()
        .filter(|member| member.user_id != event.actor)
    {
        let notification = Notification {
            recipient: member.user_id,
            business_id: event.business_id,
            actor: event.actor.clone(),
            message: message.clone(),
        };
        if let Err(err) = notifier.notify(&notification).await {
            tracing::warn!(recipient = %notification.recipient, "{err}");
        }
    }
}
