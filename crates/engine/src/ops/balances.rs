use std::collections::HashMap;

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    AggregateDelta, EngineError, Entry, LedgerEvent, LedgerEventKind, ResultEngine, Role, Totals,
    TotalsDelta, books, counterparties, entries,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds `delta` to a book's totals with an in-place increment, so
    /// concurrent writers never overwrite each other.
    ///
    /// The stored totals are checked first: a delta that would overflow any
    /// column fails with `InvalidAmount` and nothing is written.
    pub(super) async fn apply_book_delta(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        delta: TotalsDelta,
    ) -> ResultEngine<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let model = books::Entity::find_by_id(book_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("book not exists".to_string()))?;
        Totals {
            total_in: model.total_in,
            total_out: model.total_out,
            net: model.net_balance,
        }
        .apply(delta)?;

        books::Entity::update_many()
            .col_expr(
                books::Column::TotalIn,
                Expr::col(books::Column::TotalIn).add(delta.total_in),
            )
            .col_expr(
                books::Column::TotalOut,
                Expr::col(books::Column::TotalOut).add(delta.total_out),
            )
            .col_expr(
                books::Column::NetBalance,
                Expr::col(books::Column::NetBalance).add(delta.net),
            )
            .filter(books::Column::Id.eq(model.id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub(super) async fn apply_counterparty_delta(
        &self,
        db: &DatabaseTransaction,
        counterparty_id: Uuid,
        delta: TotalsDelta,
    ) -> ResultEngine<()> {
        if delta.is_zero() {
            return Ok(());
        }
        let model = counterparties::Entity::find_by_id(counterparty_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("counterparty not exists".to_string()))?;
        Totals {
            total_in: model.total_in,
            total_out: model.total_out,
            net: model.balance,
        }
        .apply(delta)?;

        counterparties::Entity::update_many()
            .col_expr(
                counterparties::Column::TotalIn,
                Expr::col(counterparties::Column::TotalIn).add(delta.total_in),
            )
            .col_expr(
                counterparties::Column::TotalOut,
                Expr::col(counterparties::Column::TotalOut).add(delta.total_out),
            )
            .col_expr(
                counterparties::Column::Balance,
                Expr::col(counterparties::Column::Balance).add(delta.net),
            )
            .filter(counterparties::Column::Id.eq(model.id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub(super) async fn apply_aggregate_delta(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        delta: &AggregateDelta,
    ) -> ResultEngine<()> {
        self.apply_book_delta(db, book_id, delta.book).await?;
        for counterparty in &delta.counterparties {
            self.apply_counterparty_delta(db, counterparty.counterparty_id, counterparty.delta)
                .await?;
        }
        Ok(())
    }

    /// Recomputes every book and counterparty total of a business from its
    /// entries.
    ///
    /// Returns how many aggregates had drifted and were rewritten.
    pub async fn recompute_aggregates(&self, business_id: Uuid, user_id: &str) -> ResultEngine<u64> {
        let corrected = with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Partner, "recompute totals")
                .await?;

            let book_models = books::Entity::find()
                .filter(books::Column::BusinessId.eq(business_id.to_string()))
                .all(&db_tx)
                .await?;
            let counterparty_models = counterparties::Entity::find()
                .filter(counterparties::Column::BusinessId.eq(business_id.to_string()))
                .all(&db_tx)
                .await?;
            let entry_models = entries::Entity::find()
                .filter(entries::Column::BusinessId.eq(business_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut book_totals: HashMap<String, Totals> = book_models
                .iter()
                .map(|m| (m.id.clone(), Totals::default()))
                .collect();
            let mut counterparty_totals: HashMap<String, Totals> = counterparty_models
                .iter()
                .map(|m| (m.id.clone(), Totals::default()))
                .collect();

            for model in entry_models {
                let entry = Entry::try_from(model)?;
                let contribution = TotalsDelta::contribution(entry.direction, entry.amount_minor);
                if let Some(totals) = book_totals.get_mut(&entry.book_id.to_string()) {
                    *totals = totals.apply(contribution)?;
                }
                if let Some(counterparty_id) = entry.counterparty_id
                    && let Some(totals) = counterparty_totals.get_mut(&counterparty_id.to_string())
                {
                    *totals = totals.apply(contribution)?;
                }
            }

            let mut corrected = 0u64;
            for model in book_models {
                let expected = book_totals.get(&model.id).copied().unwrap_or_default();
                let stored = Totals {
                    total_in: model.total_in,
                    total_out: model.total_out,
                    net: model.net_balance,
                };
                if stored == expected {
                    continue;
                }
                tracing::warn!(book_id = %model.id, ?stored, ?expected, "book totals drifted");
                books::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    total_in: ActiveValue::Set(expected.total_in),
                    total_out: ActiveValue::Set(expected.total_out),
                    net_balance: ActiveValue::Set(expected.net),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                corrected += 1;
            }

            for model in counterparty_models {
                let expected = counterparty_totals
                    .get(&model.id)
                    .copied()
                    .unwrap_or_default();
                let stored = Totals {
                    total_in: model.total_in,
                    total_out: model.total_out,
                    net: model.balance,
                };
                if stored == expected {
                    continue;
                }
                tracing::warn!(
                    counterparty_id = %model.id,
                    ?stored,
                    ?expected,
                    "counterparty totals drifted"
                );
                counterparties::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    total_in: ActiveValue::Set(expected.total_in),
                    total_out: ActiveValue::Set(expected.total_out),
                    balance: ActiveValue::Set(expected.net),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                corrected += 1;
            }

            Ok(corrected)
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::AggregatesRecomputed { corrected },
        ));
        Ok(corrected)
    }
}
