//! Aggregate maintenance.
//!
//! Books and counterparties carry denormalized running totals. Whenever an
//! entry is created, edited, deleted or moved, [`compute_delta`] derives the
//! signed deltas that keep those totals equal to the sums over the entries.
//!
//! The computation is reversal-then-application: the old state's contribution
//! is subtracted, then the new state's contribution is added. Everything is
//! integer minor units, so reversing and re-applying the same state restores
//! the totals exactly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Direction, EngineError, ResultEngine};

/// The part of an entry that contributes to aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryState {
    pub direction: Direction,
    pub amount_minor: i64,
    pub counterparty_id: Option<Uuid>,
}

/// Running totals held by a book or a counterparty.
///
/// `net` is `net_balance` for books and `balance` for counterparties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_in: i64,
    pub total_out: i64,
    pub net: i64,
}

impl Totals {
    #[must_use]
    pub const fn new(total_in: i64, total_out: i64) -> Self {
        Self {
            total_in,
            total_out,
            net: total_in - total_out,
        }
    }

    /// `net == total_in - total_out`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total_in.checked_sub(self.total_out) == Some(self.net)
    }

    pub fn apply(&self, delta: TotalsDelta) -> ResultEngine<Self> {
        Ok(Self {
            total_in: checked(self.total_in.checked_add(delta.total_in))?,
            total_out: checked(self.total_out.checked_add(delta.total_out))?,
            net: checked(self.net.checked_add(delta.net))?,
        })
    }
}

/// Signed change to apply to a [`Totals`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TotalsDelta {
    pub total_in: i64,
    pub total_out: i64,
    pub net: i64,
}

impl TotalsDelta {
    /// What a single entry adds to the totals of its targets.
    #[must_use]
    pub const fn contribution(direction: Direction, amount_minor: i64) -> Self {
        match direction {
            Direction::In => Self {
                total_in: amount_minor,
                total_out: 0,
                net: amount_minor,
            },
            Direction::Out => Self {
                total_in: 0,
                total_out: amount_minor,
                net: -amount_minor,
            },
        }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.total_in == 0 && self.total_out == 0 && self.net == 0
    }

    pub(crate) fn checked_add(self, rhs: Self) -> ResultEngine<Self> {
        Ok(Self {
            total_in: checked(self.total_in.checked_add(rhs.total_in))?,
            total_out: checked(self.total_out.checked_add(rhs.total_out))?,
            net: checked(self.net.checked_add(rhs.net))?,
        })
    }

    pub(crate) fn checked_sub(self, rhs: Self) -> ResultEngine<Self> {
        Ok(Self {
            total_in: checked(self.total_in.checked_sub(rhs.total_in))?,
            total_out: checked(self.total_out.checked_sub(rhs.total_out))?,
            net: checked(self.net.checked_sub(rhs.net))?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterpartyDelta {
    pub counterparty_id: Uuid,
    pub delta: TotalsDelta,
}

/// Deltas produced by one entry state change.
///
/// `counterparties` holds at most two items, one per distinct counterparty,
/// and never a zero delta.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateDelta {
    pub book: TotalsDelta,
    pub counterparties: Vec<CounterpartyDelta>,
}

fn checked(value: Option<i64>) -> ResultEngine<i64> {
    value.ok_or_else(|| EngineError::InvalidAmount("aggregate overflow".to_string()))
}

fn validate(state: &EntryState) -> ResultEngine<()> {
    if state.amount_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be >= 0".to_string(),
        ));
    }
    Ok(())
}

/// Computes the aggregate deltas for an entry going from `old` to `new`.
///
/// - `old = None`: the entry is being created.
/// - `new = None`: the entry is being deleted.
///
/// When both states reference the same counterparty, its reversal and
/// application are merged into one delta. Different counterparties get
/// independent deltas.
pub fn compute_delta(
    old: Option<&EntryState>,
    new: Option<&EntryState>,
) -> ResultEngine<AggregateDelta> {
    let mut out = AggregateDelta::default();

    if let Some(old) = old {
        validate(old)?;
        let reversal = TotalsDelta::contribution(old.direction, old.amount_minor);
        out.book = out.book.checked_sub(reversal)?;
        if let Some(counterparty_id) = old.counterparty_id {
            push_counterparty(&mut out.counterparties, counterparty_id, |d| {
                d.checked_sub(reversal)
            })?;
        }
    }

    if let Some(new) = new {
        validate(new)?;
        let application = TotalsDelta::contribution(new.direction, new.amount_minor);
        out.book = out.book.checked_add(application)?;
        if let Some(counterparty_id) = new.counterparty_id {
            push_counterparty(&mut out.counterparties, counterparty_id, |d| {
                d.checked_add(application)
            })?;
        }
    }

    out.counterparties.retain(|c| !c.delta.is_zero());
    Ok(out)
}

fn push_counterparty(
    deltas: &mut Vec<CounterpartyDelta>,
    counterparty_id: Uuid,
    op: impl FnOnce(TotalsDelta) -> ResultEngine<TotalsDelta>,
) -> ResultEngine<()> {
    match deltas
        .iter_mut()
        .find(|c| c.counterparty_id == counterparty_id)
    {
        Some(existing) => existing.delta = op(existing.delta)?,
        None => deltas.push(CounterpartyDelta {
            counterparty_id,
            delta: op(TotalsDelta::default())?,
        }),
    }
    Ok(())
}
