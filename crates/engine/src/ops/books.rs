use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Book, EngineError, Entry, LedgerEvent, LedgerEventKind, ResultEngine, Role, TotalsDelta, books,
    entries, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    async fn ensure_unique_book_name(
        &self,
        db: &DatabaseTransaction,
        business_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query =
            books::Entity::find().filter(books::Column::BusinessId.eq(business_id.to_string()));
        if let Some(id) = exclude {
            query = query.filter(books::Column::Id.ne(id.to_string()));
        }
        let wanted = name.to_lowercase();
        let taken = query
            .all(db)
            .await?
            .iter()
            .any(|book| book.name.to_lowercase() == wanted);
        if taken {
            return Err(EngineError::ExistingKey(format!(
                "book named {name} already exists"
            )));
        }
        Ok(())
    }

    /// Creates an empty book. Names are unique per business, ignoring case.
    pub async fn create_book(
        &self,
        business_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "book")?;
        let id = Uuid::new_v4();

        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Partner, "create book")
                .await?;
            self.ensure_unique_book_name(&db_tx, business_id, &name, None)
                .await?;
            books::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                business_id: ActiveValue::Set(business_id.to_string()),
                name: ActiveValue::Set(name),
                total_in: ActiveValue::Set(0),
                total_out: ActiveValue::Set(0),
                net_balance: ActiveValue::Set(0),
                created_at: ActiveValue::Set(Utc::now()),
                created_by: ActiveValue::Set(user_id.to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::BookCreated { book_id: id },
        ));
        Ok(id)
    }

    pub async fn rename_book(
        &self,
        business_id: Uuid,
        book_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "book")?;
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Partner, "rename book")
                .await?;
            let model = self.require_book(&db_tx, business_id, book_id).await?;
            self.ensure_unique_book_name(&db_tx, business_id, &name, Some(book_id))
                .await?;
            books::ActiveModel {
                id: ActiveValue::Set(model.id),
                name: ActiveValue::Set(name),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(())
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::BookRenamed { book_id },
        ));
        Ok(())
    }

    pub async fn book(&self, business_id: Uuid, book_id: Uuid, user_id: &str) -> ResultEngine<Book> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "read book")
                .await?;
            Book::try_from(self.require_book(&db_tx, business_id, book_id).await?)
        })
    }

    pub async fn list_books(&self, business_id: Uuid, user_id: &str) -> ResultEngine<Vec<Book>> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "list books")
                .await?;
            books::Entity::find()
                .filter(books::Column::BusinessId.eq(business_id.to_string()))
                .order_by_asc(books::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Book::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Deletes a book with all its entries (owner-only).
    ///
    /// The counterparty totals lose the contribution of every removed entry.
    /// Returns how many entries were removed.
    pub async fn delete_book(
        &self,
        business_id: Uuid,
        book_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<u64> {
        let removed = with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Owner, "delete book")
                .await?;
            let model = self.require_book(&db_tx, business_id, book_id).await?;

            let owned = entries::Entity::find()
                .filter(entries::Column::BookId.eq(model.id.clone()))
                .all(&db_tx)
                .await?;

            let mut reversals: HashMap<Uuid, TotalsDelta> = HashMap::new();
            for entry in owned {
                let entry = Entry::try_from(entry)?;
                let Some(counterparty_id) = entry.counterparty_id else {
                    continue;
                };
                let contribution = TotalsDelta::contribution(entry.direction, entry.amount_minor);
                let slot = reversals.entry(counterparty_id).or_default();
                *slot = slot.checked_sub(contribution)?;
            }
            for (counterparty_id, delta) in reversals {
                self.apply_counterparty_delta(&db_tx, counterparty_id, delta)
                    .await?;
            }

            let removed = entries::Entity::delete_many()
                .filter(entries::Column::BookId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            books::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(removed)
        })?;

        tracing::info!(%business_id, %book_id, entries_removed = removed, "book deleted");
        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::BookDeleted {
                book_id,
                entries_removed: removed,
            },
        ));
        Ok(removed)
    }
}
