//! The module contains `Book` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Totals, util::parse_uuid};

/// A book.
///
/// A book is a named ledger inside a business. It holds the running totals
/// of the entries it currently owns; `net_balance` is always
/// `total_in - total_out`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub total_in: i64,
    pub total_out: i64,
    pub net_balance: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Book {
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals {
            total_in: self.total_in,
            total_out: self.total_out,
            net: self.net_balance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub total_in: i64,
    pub total_out: i64,
    pub net_balance: i64,
    pub created_at: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(
        belongs_to = "super::businesses::Entity",
        from = "Column::BusinessId",
        to = "super::businesses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Businesses,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Book {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "book")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            name: model.name,
            total_in: model.total_in,
            total_out: model.total_out,
            net_balance: model.net_balance,
            created_at: model.created_at,
            created_by: model.created_by,
        })
    }
}
