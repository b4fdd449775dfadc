//! Multi-business cash ledger engine.
//!
//! Businesses own books and counterparties; members record cash-in/cash-out
//! entries into books. The engine keeps the denormalized book and
//! counterparty totals consistent with the entry set: every entry mutation
//! and the matching aggregate increments share one database transaction.

pub use aggregate::{AggregateDelta, CounterpartyDelta, EntryState, Totals, TotalsDelta, compute_delta};
pub use books::Book;
pub use businesses::Business;
pub use commands::{AddEntryCmd, UpdateEntryCmd};
pub use counterparties::{Counterparty, CounterpartyKind};
pub use currency::Currency;
pub use entries::{Direction, Entry};
pub use error::EngineError;
pub use events::{LedgerEvent, LedgerEventKind, LogNotifier, Notification, Notifier, NotifyError};
pub use memberships::Member;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, EntryListFilter, EntryPage};
pub use role::Role;

mod aggregate;
mod books;
mod businesses;
mod commands;
mod counterparties;
mod currency;
mod entries;
mod error;
mod events;
mod memberships;
mod money;
mod ops;
mod role;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
