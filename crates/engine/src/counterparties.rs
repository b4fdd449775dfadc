//! Customers and vendors referenced by entries.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Totals, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyKind {
    Customer,
    Vendor,
}

impl CounterpartyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }
}

impl TryFrom<&str> for CounterpartyKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            other => Err(EngineError::InvalidName(format!(
                "invalid counterparty kind: {other}"
            ))),
        }
    }
}

/// A counterparty mirrors the book totals, summed only over the entries that
/// reference it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub kind: CounterpartyKind,
    pub phone: Option<String>,
    pub total_in: i64,
    pub total_out: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Counterparty {
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals {
            total_in: self.total_in,
            total_out: self.total_out,
            net: self.balance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "counterparties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub kind: String,
    pub phone: Option<String>,
    pub total_in: i64,
    pub total_out: i64,
    pub balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::businesses::Entity",
        from = "Column::BusinessId",
        to = "super::businesses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Businesses,
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Counterparty {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "counterparty")?,
            business_id: parse_uuid(&model.business_id, "business")?,
            name: model.name,
            kind: CounterpartyKind::try_from(model.kind.as_str())?,
            phone: model.phone,
            total_in: model.total_in,
            total_out: model.total_out,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}
