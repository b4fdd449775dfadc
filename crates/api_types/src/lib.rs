use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Inr,
}

pub mod business {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessNew {
        pub name: String,
        /// Defaults to EUR.
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessView {
        pub id: Uuid,
        pub name: String,
        pub currency: Currency,
        pub owner_id: String,
        /// Role of the caller, when listing.
        pub role: Option<super::membership::Role>,
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessesResponse {
        pub businesses: Vec<BusinessView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Recomputed {
        /// Number of book and counterparty totals that were rewritten.
        pub corrected: u64,
    }
}

pub mod membership {
    use super::*;

    /// Role of a user in a business.
    ///
    /// - `owner`: everything, including members and deleting books.
    /// - `partner`: records entries, manages books and counterparties.
    /// - `viewer`: read-only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Owner,
        Partner,
        Viewer,
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub user_id: String,
        pub role: Role,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
        pub role: Role,
        pub joined_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod book {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookView {
        pub id: Uuid,
        pub name: String,
        pub total_in_minor: i64,
        pub total_out_minor: i64,
        pub net_balance_minor: i64,
        pub created_at: DateTime<FixedOffset>,
        pub created_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BooksResponse {
        pub books: Vec<BookView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookDeleted {
        pub entries_removed: u64,
    }
}

pub mod counterparty {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CounterpartyKind {
        Customer,
        Vendor,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CounterpartyNew {
        pub name: String,
        pub kind: CounterpartyKind,
        pub phone: Option<String>,
    }

    /// Absent fields are kept; an empty `phone` clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CounterpartyUpdate {
        pub name: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CounterpartyQuery {
        pub kind: Option<CounterpartyKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CounterpartyCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CounterpartyView {
        pub id: Uuid,
        pub name: String,
        pub kind: CounterpartyKind,
        pub phone: Option<String>,
        pub total_in_minor: i64,
        pub total_out_minor: i64,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CounterpartiesResponse {
        pub counterparties: Vec<CounterpartyView>,
    }
}

pub mod entry {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Direction {
        In,
        Out,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryNew {
        pub book_id: Uuid,
        pub direction: Direction,
        /// Must be >= 0. The direction defines the sign.
        pub amount_minor: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub counterparty_id: Option<Uuid>,
        pub remark: Option<String>,
        pub category: Option<String>,
        pub payment_mode: Option<String>,
    }

    /// Absent fields are kept. Empty text fields are cleared.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryUpdate {
        pub direction: Option<Direction>,
        pub amount_minor: Option<i64>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub counterparty_id: Option<Uuid>,
        /// Unlink the counterparty. Must not be combined with `counterparty_id`.
        #[serde(default)]
        pub clear_counterparty: bool,
        pub remark: Option<String>,
        pub category: Option<String>,
        pub payment_mode: Option<String>,
        /// Reject the update if the entry changed since this version was read.
        pub expected_version: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryTransfer {
        pub target_book_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub book_id: Uuid,
        pub counterparty_id: Option<Uuid>,
        pub direction: Direction,
        pub amount_minor: i64,
        pub occurred_at: DateTime<FixedOffset>,
        pub remark: Option<String>,
        pub category: Option<String>,
        pub payment_mode: Option<String>,
        pub created_by: String,
        pub updated_by: String,
        pub version: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryListQuery {
        pub book_id: Option<Uuid>,
        /// Inclusive lower bound.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<FixedOffset>>,
        pub direction: Option<Direction>,
        pub counterparty_id: Option<Uuid>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}
