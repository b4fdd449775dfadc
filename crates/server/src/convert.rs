//! Mapping between engine types and wire DTOs.

use api_types::{
    book::BookView,
    business::BusinessView,
    counterparty::{CounterpartyKind as ApiKind, CounterpartyView},
    entry::{Direction as ApiDirection, EntryView},
    membership::{MemberView, Role as ApiRole},
};
use chrono::{DateTime, FixedOffset, Utc};

pub(crate) fn utc(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.fixed_offset()
}

pub(crate) fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
        engine::Currency::Inr => api_types::Currency::Inr,
    }
}

pub(crate) fn parse_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
        api_types::Currency::Inr => engine::Currency::Inr,
    }
}

pub(crate) fn map_role(role: engine::Role) -> ApiRole {
    match role {
        engine::Role::Owner => ApiRole::Owner,
        engine::Role::Partner => ApiRole::Partner,
        engine::Role::Viewer => ApiRole::Viewer,
    }
}

pub(crate) fn parse_role(role: ApiRole) -> engine::Role {
    match role {
        ApiRole::Owner => engine::Role::Owner,
        ApiRole::Partner => engine::Role::Partner,
        ApiRole::Viewer => engine::Role::Viewer,
    }
}

pub(crate) fn map_kind(kind: engine::CounterpartyKind) -> ApiKind {
    match kind {
        engine::CounterpartyKind::Customer => ApiKind::Customer,
        engine::CounterpartyKind::Vendor => ApiKind::Vendor,
    }
}

pub(crate) fn parse_kind(kind: ApiKind) -> engine::CounterpartyKind {
    match kind {
        ApiKind::Customer => engine::CounterpartyKind::Customer,
        ApiKind::Vendor => engine::CounterpartyKind::Vendor,
    }
}

pub(crate) fn map_direction(direction: engine::Direction) -> ApiDirection {
    match direction {
        engine::Direction::In => ApiDirection::In,
        engine::Direction::Out => ApiDirection::Out,
    }
}

pub(crate) fn parse_direction(direction: ApiDirection) -> engine::Direction {
    match direction {
        ApiDirection::In => engine::Direction::In,
        ApiDirection::Out => engine::Direction::Out,
    }
}

pub(crate) fn business_view(business: engine::Business, role: Option<engine::Role>) -> BusinessView {
    BusinessView {
        id: business.id,
        name: business.name,
        currency: map_currency(business.currency),
        owner_id: business.owner_id,
        role: role.map(map_role),
        created_at: utc(business.created_at),
    }
}

pub(crate) fn member_view(member: engine::Member) -> MemberView {
    MemberView {
        user_id: member.user_id,
        role: map_role(member.role),
        joined_at: utc(member.joined_at),
    }
}

pub(crate) fn book_view(book: engine::Book) -> BookView {
    BookView {
        id: book.id,
        name: book.name,
        total_in_minor: book.total_in,
        total_out_minor: book.total_out,
        net_balance_minor: book.net_balance,
        created_at: utc(book.created_at),
        created_by: book.created_by,
    }
}

pub(crate) fn counterparty_view(counterparty: engine::Counterparty) -> CounterpartyView {
    CounterpartyView {
        id: counterparty.id,
        name: counterparty.name,
        kind: map_kind(counterparty.kind),
        phone: counterparty.phone,
        total_in_minor: counterparty.total_in,
        total_out_minor: counterparty.total_out,
        balance_minor: counterparty.balance,
    }
}

pub(crate) fn entry_view(entry: engine::Entry) -> EntryView {
    EntryView {
        id: entry.id,
        book_id: entry.book_id,
        counterparty_id: entry.counterparty_id,
        direction: map_direction(entry.direction),
        amount_minor: entry.amount_minor,
        occurred_at: utc(entry.occurred_at),
        remark: entry.remark,
        category: entry.category,
        payment_mode: entry.payment_mode,
        created_by: entry.created_by,
        updated_by: entry.updated_by,
        version: entry.version,
    }
}
