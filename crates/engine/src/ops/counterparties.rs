use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Counterparty, CounterpartyKind, LedgerEvent, LedgerEventKind, ResultEngine, Role,
    counterparties, entries,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn create_counterparty(
        &self,
        business_id: Uuid,
        name: &str,
        kind: CounterpartyKind,
        phone: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "counterparty")?;
        let id = Uuid::new_v4();

        with_tx!(self, |db_tx| {
            self.require_business(
                &db_tx,
                business_id,
                user_id,
                Role::Partner,
                "create counterparty",
            )
            .await?;
            counterparties::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                business_id: ActiveValue::Set(business_id.to_string()),
                name: ActiveValue::Set(name),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                phone: ActiveValue::Set(normalize_optional_text(phone)),
                total_in: ActiveValue::Set(0),
                total_out: ActiveValue::Set(0),
                balance: ActiveValue::Set(0),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::CounterpartyCreated {
                counterparty_id: id,
            },
        ));
        Ok(id)
    }

    /// Updates the name and/or phone. `phone = Some("")` clears it. Totals
    /// are never touched here.
    pub async fn update_counterparty(
        &self,
        business_id: Uuid,
        counterparty_id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
        user_id: &str,
    ) -> ResultEngine<Counterparty> {
        let name = name
            .map(|name| normalize_required_name(name, "counterparty"))
            .transpose()?;

        let updated = with_tx!(self, |db_tx| {
            self.require_business(
                &db_tx,
                business_id,
                user_id,
                Role::Partner,
                "update counterparty",
            )
            .await?;
            let model = self
                .require_counterparty(&db_tx, business_id, counterparty_id)
                .await?;

            if name.is_none() && phone.is_none() {
                return Counterparty::try_from(model);
            }
            let mut active = counterparties::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if phone.is_some() {
                active.phone = ActiveValue::Set(apply_optional_text_patch(model.phone, phone));
            }
            let saved = active.update(&db_tx).await?;
            Counterparty::try_from(saved)
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::CounterpartyUpdated { counterparty_id },
        ));
        Ok(updated)
    }

    pub async fn counterparty(
        &self,
        business_id: Uuid,
        counterparty_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Counterparty> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "read counterparty")
                .await?;
            Counterparty::try_from(
                self.require_counterparty(&db_tx, business_id, counterparty_id)
                    .await?,
            )
        })
    }

    pub async fn list_counterparties(
        &self,
        business_id: Uuid,
        kind: Option<CounterpartyKind>,
        user_id: &str,
    ) -> ResultEngine<Vec<Counterparty>> {
        with_tx!(self, |db_tx| {
            self.require_business(
                &db_tx,
                business_id,
                user_id,
                Role::Viewer,
                "list counterparties",
            )
            .await?;
            let mut query = counterparties::Entity::find()
                .filter(counterparties::Column::BusinessId.eq(business_id.to_string()));
            if let Some(kind) = kind {
                query = query.filter(counterparties::Column::Kind.eq(kind.as_str()));
            }
            query
                .order_by_asc(counterparties::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Counterparty::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Deletes a counterparty. Entries referencing it are kept and unlinked,
    /// so book totals are unchanged.
    pub async fn delete_counterparty(
        &self,
        business_id: Uuid,
        counterparty_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_business(
                &db_tx,
                business_id,
                user_id,
                Role::Partner,
                "delete counterparty",
            )
            .await?;
            let model = self
                .require_counterparty(&db_tx, business_id, counterparty_id)
                .await?;

            let unlinked = entries::Entity::update_many()
                .set(entries::ActiveModel {
                    counterparty_id: ActiveValue::Set(None),
                    ..Default::default()
                })
                .filter(entries::Column::CounterpartyId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            counterparties::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            tracing::debug!(%counterparty_id, unlinked, "counterparty deleted");
            Ok(())
        })?;

        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::CounterpartyDeleted { counterparty_id },
        ));
        Ok(())
    }
}
