use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    AddEntryCmd, EngineError, Entry, EntryState, LedgerEvent, LedgerEventKind, ResultEngine, Role,
    UpdateEntryCmd, compute_delta, entries,
    util::{apply_optional_text_patch, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a new entry and adds its contribution to the book and
    /// counterparty totals.
    pub async fn add_entry(&self, cmd: AddEntryCmd) -> ResultEngine<Uuid> {
        let entry = with_tx!(self, |db_tx| {
            self.require_business(&db_tx, cmd.business_id, &cmd.user_id, Role::Partner, "add entry")
                .await?;
            self.require_book(&db_tx, cmd.business_id, cmd.book_id)
                .await?;
            if let Some(counterparty_id) = cmd.counterparty_id {
                self.require_counterparty(&db_tx, cmd.business_id, counterparty_id)
                    .await?;
            }

            let now = Utc::now();
            let entry = Entry {
                id: Uuid::new_v4(),
                business_id: cmd.business_id,
                book_id: cmd.book_id,
                counterparty_id: cmd.counterparty_id,
                direction: cmd.direction,
                amount_minor: cmd.amount_minor,
                occurred_at: cmd.occurred_at,
                remark: normalize_optional_text(cmd.remark.as_deref()),
                category: normalize_optional_text(cmd.category.as_deref()),
                payment_mode: normalize_optional_text(cmd.payment_mode.as_deref()),
                created_at: now,
                created_by: cmd.user_id.clone(),
                updated_at: now,
                updated_by: cmd.user_id.clone(),
                version: 0,
            };
            let delta = compute_delta(None, Some(&entry.state()))?;

            entries::ActiveModel::from(&entry).insert(&db_tx).await?;
            self.apply_aggregate_delta(&db_tx, entry.book_id, &delta)
                .await?;
            Ok(entry)
        })?;

        tracing::debug!(entry_id = %entry.id, book_id = %entry.book_id, "entry added");
        self.publish(LedgerEvent::new(
            entry.business_id,
            &cmd.user_id,
            LedgerEventKind::EntryAdded {
                book_id: entry.book_id,
                entry_id: entry.id,
                direction: entry.direction,
                amount_minor: entry.amount_minor,
            },
        ));
        Ok(entry.id)
    }

    /// Patches an entry and moves its contribution from the stored state to
    /// the merged one.
    pub async fn update_entry(&self, cmd: UpdateEntryCmd) -> ResultEngine<Entry> {
        let updated = with_tx!(self, |db_tx| {
            self.require_business(
                &db_tx,
                cmd.business_id,
                &cmd.user_id,
                Role::Partner,
                "update entry",
            )
            .await?;
            let stored = Entry::try_from(
                self.require_entry(&db_tx, cmd.business_id, cmd.entry_id)
                    .await?,
            )?;
            if let Some(expected) = cmd.expected_version
                && expected != stored.version
            {
                return Err(version_conflict(expected, stored.version));
            }
            if let Some(Some(counterparty_id)) = cmd.counterparty_id {
                self.require_counterparty(&db_tx, cmd.business_id, counterparty_id)
                    .await?;
            }

            let merged = merge_patch(&stored, &cmd);
            let delta = compute_delta(Some(&stored.state()), Some(&merged.state()))?;

            let result = entries::Entity::update_many()
                .set(entries::ActiveModel::from(&merged))
                .filter(entries::Column::Id.eq(stored.id.to_string()))
                .filter(entries::Column::Version.eq(stored.version))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::Conflict(
                    "entry was modified concurrently".to_string(),
                ));
            }

            self.apply_aggregate_delta(&db_tx, merged.book_id, &delta)
                .await?;
            Ok(merged)
        })?;

        self.publish(LedgerEvent::new(
            updated.business_id,
            &cmd.user_id,
            LedgerEventKind::EntryUpdated {
                book_id: updated.book_id,
                entry_id: updated.id,
            },
        ));
        Ok(updated)
    }

    /// Deletes an entry and reverses its contribution.
    pub async fn delete_entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        let removed = with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Partner, "delete entry")
                .await?;
            let stored = Entry::try_from(self.require_entry(&db_tx, business_id, entry_id).await?)?;
            let delta = compute_delta(Some(&stored.state()), None)?;

            entries::Entity::delete_by_id(stored.id.to_string())
                .exec(&db_tx)
                .await?;
            self.apply_aggregate_delta(&db_tx, stored.book_id, &delta)
                .await?;
            Ok(stored)
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::EntryDeleted {
                book_id: removed.book_id,
                entry_id: removed.id,
            },
        ));
        Ok(())
    }

    /// Moves an entry to another book of the same business.
    ///
    /// The entry is re-created under a new id in the target book; the source
    /// entry is removed. Only the two book totals change: the counterparty
    /// keeps the same contribution.
    pub async fn transfer_entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
        target_book_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let (source, moved) = with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Partner, "transfer entry")
                .await?;
            let source = Entry::try_from(self.require_entry(&db_tx, business_id, entry_id).await?)?;
            if source.book_id == target_book_id {
                return Err(EngineError::InvalidTransfer(
                    "entry already belongs to the target book".to_string(),
                ));
            }
            self.require_book(&db_tx, business_id, target_book_id)
                .await?;

            let moved = Entry {
                id: Uuid::new_v4(),
                book_id: target_book_id,
                updated_at: Utc::now(),
                updated_by: user_id.to_string(),
                version: 0,
                ..source.clone()
            };
            self.move_entry(&db_tx, &source, &moved).await?;
            Ok((source, moved))
        })?;

        tracing::debug!(
            from = %source.book_id,
            to = %moved.book_id,
            new_entry_id = %moved.id,
            "entry transferred"
        );
        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::EntryTransferred {
                from_book_id: source.book_id,
                to_book_id: moved.book_id,
                old_entry_id: source.id,
                new_entry_id: moved.id,
            },
        ));
        Ok(moved.id)
    }

    async fn move_entry(
        &self,
        db: &DatabaseTransaction,
        source: &Entry,
        moved: &Entry,
    ) -> ResultEngine<()> {
        let book_only = |entry: &Entry| EntryState {
            counterparty_id: None,
            ..entry.state()
        };
        let reversal = compute_delta(Some(&book_only(source)), None)?;
        let application = compute_delta(None, Some(&book_only(moved)))?;

        entries::Entity::delete_by_id(source.id.to_string())
            .exec(db)
            .await?;
        entries::ActiveModel::from(moved).insert(db).await?;

        self.apply_book_delta(db, source.book_id, reversal.book)
            .await?;
        self.apply_book_delta(db, moved.book_id, application.book)
            .await?;
        Ok(())
    }

    /// Returns a single entry.
    pub async fn entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "read entry")
                .await?;
            Entry::try_from(self.require_entry(&db_tx, business_id, entry_id).await?)
        })
    }
}

fn version_conflict(expected: i64, stored: i64) -> EngineError {
    EngineError::Conflict(format!(
        "entry version is {stored}, expected {expected}"
    ))
}

fn merge_patch(stored: &Entry, cmd: &UpdateEntryCmd) -> Entry {
    Entry {
        direction: cmd.direction.unwrap_or(stored.direction),
        amount_minor: cmd.amount_minor.unwrap_or(stored.amount_minor),
        occurred_at: cmd.occurred_at.unwrap_or(stored.occurred_at),
        counterparty_id: cmd.counterparty_id.unwrap_or(stored.counterparty_id),
        remark: apply_optional_text_patch(stored.remark.clone(), cmd.remark.as_deref()),
        category: apply_optional_text_patch(stored.category.clone(), cmd.category.as_deref()),
        payment_mode: apply_optional_text_patch(
            stored.payment_mode.clone(),
            cmd.payment_mode.as_deref(),
        ),
        updated_at: Utc::now(),
        updated_by: cmd.user_id.clone(),
        version: stored.version + 1,
        ..stored.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::Direction;

    fn stored() -> Entry {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Entry {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            counterparty_id: Some(Uuid::new_v4()),
            direction: Direction::In,
            amount_minor: 100,
            occurred_at: at,
            remark: Some("rent".to_string()),
            category: Some("office".to_string()),
            payment_mode: None,
            created_at: at,
            created_by: "alice".to_string(),
            updated_at: at,
            updated_by: "alice".to_string(),
            version: 3,
        }
    }

    #[test]
    fn empty_patch_keeps_fields_and_bumps_version() {
        let entry = stored();
        let cmd = UpdateEntryCmd::new(entry.business_id, entry.id, "bob");
        let merged = merge_patch(&entry, &cmd);

        assert_eq!(merged.state(), entry.state());
        assert_eq!(merged.remark, entry.remark);
        assert_eq!(merged.created_by, "alice");
        assert_eq!(merged.updated_by, "bob");
        assert_eq!(merged.version, 4);
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let entry = stored();
        let cmd = UpdateEntryCmd::new(entry.business_id, entry.id, "bob")
            .amount_minor(250)
            .direction(Direction::Out)
            .clear_counterparty()
            .remark("")
            .payment_mode("upi");
        let merged = merge_patch(&entry, &cmd);

        assert_eq!(merged.amount_minor, 250);
        assert_eq!(merged.direction, Direction::Out);
        assert_eq!(merged.counterparty_id, None);
        assert_eq!(merged.remark, None);
        assert_eq!(merged.category.as_deref(), Some("office"));
        assert_eq!(merged.payment_mode.as_deref(), Some("upi"));
        assert_eq!(merged.id, entry.id);
        assert_eq!(merged.book_id, entry.book_id);
    }
}
