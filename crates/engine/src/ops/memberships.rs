use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, LedgerEvent, LedgerEventKind, Member, ResultEngine, Role, memberships,
    util::validate_user_id,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds a member or changes the role of an existing one (owner-only).
    ///
    /// The last owner of a business cannot be demoted.
    pub async fn upsert_member(
        &self,
        business_id: Uuid,
        member_id: &str,
        role: Role,
        user_id: &str,
    ) -> ResultEngine<()> {
        validate_user_id(member_id)?;
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Owner, "manage members")
                .await?;

            match self.membership_role(&db_tx, business_id, member_id).await? {
                Some(current) => {
                    if current == role {
                        return Ok(());
                    }
                    if current == Role::Owner && self.owner_count(&db_tx, business_id).await? <= 1 {
                        return Err(EngineError::PermissionDenied(
                            "the last owner cannot be demoted".to_string(),
                        ));
                    }
                    memberships::ActiveModel {
                        business_id: ActiveValue::Set(business_id.to_string()),
                        user_id: ActiveValue::Set(member_id.to_string()),
                        role: ActiveValue::Set(role.as_str().to_string()),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                }
                None => {
                    memberships::ActiveModel {
                        business_id: ActiveValue::Set(business_id.to_string()),
                        user_id: ActiveValue::Set(member_id.to_string()),
                        role: ActiveValue::Set(role.as_str().to_string()),
                        joined_at: ActiveValue::Set(Utc::now()),
                    }
                    .insert(&db_tx)
                    .await?;
                }
            }
            Ok(())
        })?;

        tracing::info!(%business_id, member = member_id, %role, "membership updated");
        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::MemberUpserted {
                user_id: member_id.to_string(),
                role,
            },
        ));
        Ok(())
    }

    /// Removes a member. Owners may remove anyone; any member may leave.
    ///
    /// The last owner cannot be removed.
    pub async fn remove_member(
        &self,
        business_id: Uuid,
        member_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let required = if member_id == user_id {
                Role::Viewer
            } else {
                Role::Owner
            };
            self.require_business(&db_tx, business_id, user_id, required, "remove member")
                .await?;

            let current = self
                .membership_role(&db_tx, business_id, member_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
            if current == Role::Owner && self.owner_count(&db_tx, business_id).await? <= 1 {
                return Err(EngineError::PermissionDenied(
                    "the last owner cannot be removed".to_string(),
                ));
            }

            memberships::Entity::delete_by_id((business_id.to_string(), member_id.to_string()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        tracing::info!(%business_id, member = member_id, "member removed");
        self.publish(LedgerEvent::new(
            business_id,
            user_id,
            LedgerEventKind::MemberRemoved {
                user_id: member_id.to_string(),
            },
        ));
        Ok(())
    }

    pub async fn list_members(&self, business_id: Uuid, user_id: &str) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id, user_id, Role::Viewer, "list members")
                .await?;
            memberships::Entity::find()
                .filter(memberships::Column::BusinessId.eq(business_id.to_string()))
                .order_by_asc(memberships::Column::JoinedAt)
                .order_by_asc(memberships::Column::UserId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Member::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// The caller's role in a business, or `None` for non-members.
    pub async fn role(&self, business_id: Uuid, user_id: &str) -> ResultEngine<Option<Role>> {
        with_tx!(self, |db_tx| {
            self.membership_role(&db_tx, business_id, user_id).await
        })
    }
}
