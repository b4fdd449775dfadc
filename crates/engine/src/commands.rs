//! Command structs for engine operations.
//!
//! These types group parameters for entry write operations (add/update),
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Direction;

/// Record a new entry in a book.
#[derive(Clone, Debug)]
pub struct AddEntryCmd {
    pub business_id: Uuid,
    pub book_id: Uuid,
    pub direction: Direction,
    pub amount_minor: i64,
    pub occurred_at: DateTime<Utc>,
    pub counterparty_id: Option<Uuid>,
    pub remark: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    pub user_id: String,
}

impl AddEntryCmd {
    #[must_use]
    pub fn new(
        business_id: Uuid,
        book_id: Uuid,
        user_id: impl Into<String>,
        direction: Direction,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            business_id,
            book_id,
            direction,
            amount_minor,
            occurred_at,
            counterparty_id: None,
            remark: None,
            category: None,
            payment_mode: None,
            user_id: user_id.into(),
        }
    }

    /// Shorthand for a cash-in entry.
    #[must_use]
    pub fn cash_in(
        business_id: Uuid,
        book_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            business_id,
            book_id,
            user_id,
            Direction::In,
            amount_minor,
            occurred_at,
        )
    }

    /// Shorthand for a cash-out entry.
    #[must_use]
    pub fn cash_out(
        business_id: Uuid,
        book_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            business_id,
            book_id,
            user_id,
            Direction::Out,
            amount_minor,
            occurred_at,
        )
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty_id: Uuid) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn payment_mode(mut self, payment_mode: impl Into<String>) -> Self {
        self.payment_mode = Some(payment_mode.into());
        self
    }
}

/// Patch an existing entry.
///
/// `None` fields keep the stored value. Text fields set to an empty string
/// are cleared. The counterparty uses a nested option: `Some(None)` unlinks
/// it.
#[derive(Clone, Debug)]
pub struct UpdateEntryCmd {
    pub business_id: Uuid,
    pub entry_id: Uuid,
    pub direction: Option<Direction>,
    pub amount_minor: Option<i64>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub counterparty_id: Option<Option<Uuid>>,
    pub remark: Option<String>,
    pub category: Option<String>,
    pub payment_mode: Option<String>,
    /// When set, the update fails with `Conflict` unless the stored entry
    /// still has this version.
    pub expected_version: Option<i64>,
    pub user_id: String,
}

impl UpdateEntryCmd {
    #[must_use]
    pub fn new(business_id: Uuid, entry_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            business_id,
            entry_id,
            direction: None,
            amount_minor: None,
            occurred_at: None,
            counterparty_id: None,
            remark: None,
            category: None,
            payment_mode: None,
            expected_version: None,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty_id: Uuid) -> Self {
        self.counterparty_id = Some(Some(counterparty_id));
        self
    }

    #[must_use]
    pub fn clear_counterparty(mut self) -> Self {
        self.counterparty_id = Some(None);
        self
    }

    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn payment_mode(mut self, payment_mode: impl Into<String>) -> Self {
        self.payment_mode = Some(payment_mode.into());
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}
