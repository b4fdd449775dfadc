use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Direction, EngineError, Entry, ResultEngine, Role, entries};

use super::{Engine, with_tx};

/// Filters for listing entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct EntryListFilter {
    /// Restrict to one book; `None` lists the whole business.
    pub book_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub direction: Option<Direction>,
    pub counterparty_id: Option<Uuid>,
}

impl EntryListFilter {
    #[must_use]
    pub fn book(book_id: Uuid) -> Self {
        Self {
            book_id: Some(book_id),
            ..Self::default()
        }
    }

    fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(EngineError::InvalidCursor(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(())
    }

    fn apply<Q: QueryFilter>(&self, mut query: Q) -> Q {
        if let Some(book_id) = self.book_id {
            query = query.filter(entries::Column::BookId.eq(book_id.to_string()));
        }
        if let Some(from) = self.from {
            query = query.filter(entries::Column::OccurredAt.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(entries::Column::OccurredAt.lt(to));
        }
        if let Some(direction) = self.direction {
            query = query.filter(entries::Column::Direction.eq(direction.as_str()));
        }
        if let Some(counterparty_id) = self.counterparty_id {
            query = query.filter(entries::Column::CounterpartyId.eq(counterparty_id.to_string()));
        }
        query
    }
}

/// One page of entries, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    /// Pass back to fetch the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct EntriesCursor {
    occurred_at: DateTime<Utc>,
    entry_id: String,
}

impl EntriesCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid entries cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid entries cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid entries cursor".to_string()))
    }
}

impl Engine {
    /// Lists entries of a business, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_at DESC, id DESC)`.
    pub async fn list_entries(
        &self,
        business_id: Uuid,
        user_id: &str,
        filter: &EntryListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<EntryPage> {
        if limit == 0 {
            return Err(EngineError::InvalidCursor(
                "limit must be > 0".to_string(),
            ));
        }
        filter.validate()?;

        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "list entries")
                .await?;
            if let Some(book_id) = filter.book_id {
                self.require_book(&db_tx, business_id, book_id).await?;
            }

            let mut query = entries::Entity::find()
                .filter(entries::Column::BusinessId.eq(business_id.to_string()))
                .order_by_desc(entries::Column::OccurredAt)
                .order_by_desc(entries::Column::Id)
                .limit(limit.saturating_add(1));

            if let Some(cursor) = cursor {
                let cursor = EntriesCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(entries::Column::OccurredAt.lt(cursor.occurred_at))
                        .add(
                            Condition::all()
                                .add(entries::Column::OccurredAt.eq(cursor.occurred_at))
                                .add(entries::Column::Id.lt(cursor.entry_id)),
                        ),
                );
            }
            query = filter.apply(query);

            let rows = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let entries = rows
                .into_iter()
                .take(limit as usize)
                .map(Entry::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let next_cursor = match entries.last() {
                Some(last) if has_more => Some(
                    EntriesCursor {
                        occurred_at: last.occurred_at,
                        entry_id: last.id.to_string(),
                    }
                    .encode()?,
                ),
                _ => None,
            };

            Ok(EntryPage {
                entries,
                next_cursor,
            })
        })
    }
}
