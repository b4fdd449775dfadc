//! Entry primitives.
//!
//! An `Entry` is one recorded cash movement (in or out) owned by exactly one
//! book. Its contribution to aggregates is described by [`EntryState`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntryState, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Cash inflow.
    In,
    /// Cash outflow.
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(EngineError::InvalidDirection(format!(
                "unknown entry direction: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub business_id: Uuid,
    pub book_id: Uuid,
    pub counterparty_id: Option<Uuid>,
    pub direction: Direction,
    /// Amount in minor units, never negative: the sign lives in `direction`.
    pub amount_minor: i64,
    /// Logical transaction date, editable by the user.
    pub occurred_at: DateTime<Utc>,
    pub remark: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    /// Bumped by every update; used to detect concurrent edits.
    pub version: i64,
}

impl Entry {
    #[must_use]
    pub fn state(&self) -> EntryState {
        EntryState {
            direction: self.direction,
            amount_minor: self.amount_minor,
            counterparty_id: self.counterparty_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub book_id: String,
    pub counterparty_id: Option<String>,
    pub direction: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub remark: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    pub created_at: DateTimeUtc,
    pub created_by: String,
    pub updated_at: DateTimeUtc,
    pub updated_by: String,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Books,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            business_id: ActiveValue::Set(entry.business_id.to_string()),
            book_id: ActiveValue::Set(entry.book_id.to_string()),
            counterparty_id: ActiveValue::Set(entry.counterparty_id.map(|id| id.to_string())),
            direction: ActiveValue::Set(entry.direction.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            occurred_at: ActiveValue::Set(entry.occurred_at),
            remark: ActiveValue::Set(entry.remark.clone()),
            category: ActiveValue::Set(entry.category.clone()),
            payment_mode: ActiveValue::Set(entry.payment_mode.clone()),
            created_at: ActiveValue::Set(entry.created_at),
            created_by: ActiveValue::Set(entry.created_by.clone()),
            updated_at: ActiveValue::Set(entry.updated_at),
            updated_by: ActiveValue::Set(entry.updated_by.clone()),
            version: ActiveValue::Set(entry.version),
        }
    }
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "entry")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            book_id: parse_uuid(&model.book_id, "book")?,
            counterparty_id: model
                .counterparty_id
                .as_deref()
                .map(|id| parse_uuid(id, "counterparty"))
                .transpose()?,
            direction: Direction::try_from(model.direction.as_str())?,
            amount_minor: model.amount_minor,
            occurred_at: model.occurred_at,
            remark: model.remark,
            category: model.category,
            payment_mode: model.payment_mode,
            created_at: model.created_at,
            created_by: model.created_by,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
            version: model.version,
        })
    }
}
