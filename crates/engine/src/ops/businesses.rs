use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Business, Currency, EngineError, LedgerEvent, LedgerEventKind, ResultEngine, Role, books,
    businesses, counterparties, entries, memberships,
    util::{normalize_required_name, validate_user_id},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a business. The creator becomes its first owner.
    pub async fn create_business(
        &self,
        name: &str,
        currency: Currency,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "business")?;
        validate_user_id(user_id)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            businesses::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                name: ActiveValue::Set(name),
                currency: ActiveValue::Set(currency.code().to_string()),
                owner_id: ActiveValue::Set(user_id.to_string()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            memberships::ActiveModel {
                business_id: ActiveValue::Set(id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(Role::Owner.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(())
        })?;

        tracing::info!(business_id = %id, owner = user_id, "business created");
        self.publish(LedgerEvent::new(id, user_id, LedgerEventKind::BusinessCreated));
        Ok(id)
    }

    /// Returns a business the user is a member of.
    pub async fn business(&self, business_id: Uuid, user_id: &str) -> ResultEngine<Business> {
        with_tx!(self, |db_tx| {
            let (model, _) = self
                .require_business(&db_tx, business_id, user_id, Role::Viewer, "read business")
                .await?;
            Business::try_from(model)
        })
    }

    /// Lists the businesses the user belongs to, with the user's role in each.
    pub async fn list_businesses(&self, user_id: &str) -> ResultEngine<Vec<(Business, Role)>> {
        with_tx!(self, |db_tx| {
            let rows = memberships::Entity::find()
                .filter(memberships::Column::UserId.eq(user_id.to_string()))
                .find_also_related(businesses::Entity)
                .order_by_asc(businesses::Column::Name)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (membership, business) in rows {
                let Some(business) = business else {
                    continue;
                };
                out.push((
                    Business::try_from(business)?,
                    Role::try_from(membership.role.as_str())?,
                ));
            }
            Ok(out)
        })
    }

    /// Renames a business (owner-only).
    pub async fn rename_business(
        &self,
        business_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "business")?;
        with_tx!(self, |db_tx| {
            let (model, _) = self
                .require_business(&db_tx, business_id, user_id, Role::Owner, "rename business")
                .await?;
            businesses::ActiveModel {
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
            LedgerEventKind::BusinessRenamed,
        ));
        Ok(())
    }

    /// Deletes a business with all its books, entries, counterparties and
    /// memberships (owner-only).
    pub async fn delete_business(&self, business_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Owner, "delete business")
                .await?;
            let key = business_id.to_string();

            entries::Entity::delete_many()
                .filter(entries::Column::BusinessId.eq(key.clone()))
                .exec(&db_tx)
                .await?;
            books::Entity::delete_many()
                .filter(books::Column::BusinessId.eq(key.clone()))
                .exec(&db_tx)
                .await?;
            counterparties::Entity::delete_many()
                .filter(counterparties::Column::BusinessId.eq(key.clone()))
                .exec(&db_tx)
                .await?;
            memberships::Entity::delete_many()
                .filter(memberships::Column::BusinessId.eq(key.clone()))
                .exec(&db_tx)
                .await?;
            let result = businesses::Entity::delete_by_id(key).exec(&db_tx).await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("business not exists".to_string()));
            }
            Ok(())
        })?;

        tracing::info!(%business_id, "business deleted");
        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::BusinessDeleted,
        ));
        Ok(())
    }
}
