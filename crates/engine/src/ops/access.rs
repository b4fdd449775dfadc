//! Permission gate and scoped lookups.
//!
//! Every operation starts by resolving the caller's role in the business.
//! Non-members get `KeyNotFound` so a business id does not leak its
//! existence; members below the required rank get `PermissionDenied`.

use sea_orm::{DatabaseTransaction, PaginatorTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Role, books, businesses, counterparties, entries, memberships,
};

use super::Engine;

/// Generates a `require_*` method that loads a row by id, scoped to a
/// business.
macro_rules! impl_require_in_business {
    ($require_fn:ident, $module:ident, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            business_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(target_id.to_string())
                .filter($module::Column::BusinessId.eq(business_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_in_business!(require_book, books, "book not exists");
    impl_require_in_business!(require_counterparty, counterparties, "counterparty not exists");
    impl_require_in_business!(require_entry, entries, "entry not exists");

    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        business_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<Role>> {
        let row = memberships::Entity::find_by_id((business_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| Role::try_from(m.role.as_str()))
            .transpose()
    }

    /// Loads the business and checks the caller holds at least `required`.
    pub(super) async fn require_business(
        &self,
        db: &DatabaseTransaction,
        business_id: Uuid,
        user_id: &str,
        required: Role,
        action: &str,
    ) -> ResultEngine<(businesses::Model, Role)> {
        let model = businesses::Entity::find_by_id(business_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("business not exists".to_string()))?;
        let role = self
            .membership_role(db, business_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("business not exists".to_string()))?;
        if let Err(err) = role.ensure(required, action) {
            tracing::debug!(%business_id, user_id, %role, action, "permission denied");
            return Err(err);
        }
        Ok((model, role))
    }

    pub(super) async fn owner_count(
        &self,
        db: &DatabaseTransaction,
        business_id: Uuid,
    ) -> ResultEngine<u64> {
        memberships::Entity::find()
            .filter(memberships::Column::BusinessId.eq(business_id.to_string()))
            .filter(memberships::Column::Role.eq(Role::Owner.as_str()))
            .count(db)
            .await
            .map_err(Into::into)
    }
}
