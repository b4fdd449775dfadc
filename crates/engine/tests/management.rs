use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AddEntryCmd, CounterpartyKind, Currency, Engine, EngineError, LedgerEventKind, Notification,
    Notifier, NotifyError, Role, Totals,
};
use migration::MigratorTrait;

async fn connect() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with_db() -> Engine {
    Engine::builder()
        .database(connect().await)
        .build()
        .await
        .unwrap()
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.recipient.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError("push gateway down".to_string()))
    }
}

#[tokio::test]
async fn creator_becomes_owner() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("  Tea Stall ", Currency::Inr, "alice")
        .await
        .unwrap();

    let business = engine.business(business_id, "alice").await.unwrap();
    assert_eq!(business.name, "Tea Stall");
    assert_eq!(business.currency, Currency::Inr);
    assert_eq!(business.owner_id, "alice");
    assert_eq!(
        engine.role(business_id, "alice").await.unwrap(),
        Some(Role::Owner)
    );
    assert_eq!(engine.role(business_id, "bob").await.unwrap(), None);

    let listed = engine.list_businesses("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0.id, business_id);
    assert_eq!(listed[0].1, Role::Owner);
    assert!(engine.list_businesses("bob").await.unwrap().is_empty());

    let err = engine.business(business_id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .create_business("   ", Currency::Inr, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
}

#[tokio::test]
async fn only_owners_manage_the_business() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Usd, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "pat", Role::Partner, "alice")
        .await
        .unwrap();

    let err = engine
        .upsert_member(business_id, "eve", Role::Owner, "pat")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let err = engine
        .rename_business(business_id, "Mine now", "pat")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let err = engine
        .delete_business(business_id, "pat")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine
        .rename_business(business_id, "Shop & Co", "alice")
        .await
        .unwrap();
    assert_eq!(
        engine.business(business_id, "pat").await.unwrap().name,
        "Shop & Co"
    );
}

#[tokio::test]
async fn last_owner_is_protected() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();

    let err = engine
        .upsert_member(business_id, "alice", Role::Partner, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let err = engine
        .remove_member(business_id, "alice", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine
        .upsert_member(business_id, "bob", Role::Owner, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "alice", Role::Viewer, "alice")
        .await
        .unwrap();

    let members = engine.list_members(business_id, "bob").await.unwrap();
    let roles: Vec<(String, Role)> = members
        .into_iter()
        .map(|m| (m.user_id, m.role))
        .collect();
    assert!(roles.contains(&("alice".to_string(), Role::Viewer)));
    assert!(roles.contains(&("bob".to_string(), Role::Owner)));
}

#[tokio::test]
async fn members_can_leave_and_owners_can_remove() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "vic", Role::Viewer, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "pat", Role::Partner, "alice")
        .await
        .unwrap();

    let err = engine
        .remove_member(business_id, "pat", "vic")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    engine
        .remove_member(business_id, "vic", "vic")
        .await
        .unwrap();
    engine
        .remove_member(business_id, "pat", "alice")
        .await
        .unwrap();
    assert_eq!(engine.role(business_id, "vic").await.unwrap(), None);
    assert_eq!(engine.role(business_id, "pat").await.unwrap(), None);

    let err = engine
        .remove_member(business_id, "ghost", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn book_names_are_unique_per_business() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    let main = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();

    let err = engine
        .create_book(business_id, "main", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let other = engine
        .create_book(business_id, "Savings", "alice")
        .await
        .unwrap();
    let err = engine
        .rename_book(business_id, other, "MAIN", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .rename_book(business_id, main, "Main", "alice")
        .await
        .unwrap();
    let names: Vec<String> = engine
        .list_books(business_id, "alice")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["Main".to_string(), "Savings".to_string()]);
}

#[tokio::test]
async fn deleting_a_book_reverses_counterparty_totals() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "pat", Role::Partner, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "pat")
        .await
        .unwrap();
    let keep = engine
        .create_book(business_id, "Keep", "pat")
        .await
        .unwrap();
    let customer = engine
        .create_counterparty(business_id, "Ravi", CounterpartyKind::Customer, None, "pat")
        .await
        .unwrap();

    for (book, amount) in [(book_id, 100), (book_id, 50), (keep, 30)] {
        engine
            .add_entry(
                AddEntryCmd::cash_in(business_id, book, "pat", amount, Utc::now())
                    .counterparty(customer),
            )
            .await
            .unwrap();
    }

    let err = engine
        .delete_book(business_id, book_id, "pat")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let removed = engine
        .delete_book(business_id, book_id, "alice")
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let customer = engine
        .counterparty(business_id, customer, "alice")
        .await
        .unwrap();
    assert_eq!(customer.totals(), Totals::new(30, 0));
    let err = engine
        .book(business_id, book_id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn deleting_a_counterparty_unlinks_entries() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();
    let vendor = engine
        .create_counterparty(
            business_id,
            "Mills",
            CounterpartyKind::Vendor,
            Some("+91 98450 00000"),
            "alice",
        )
        .await
        .unwrap();
    let entry_id = engine
        .add_entry(AddEntryCmd::cash_out(business_id, book_id, "alice", 60, Utc::now()).counterparty(vendor))
        .await
        .unwrap();

    let updated = engine
        .update_counterparty(business_id, vendor, Some("Mills Ltd"), Some(""), "alice")
        .await
        .unwrap();
    assert_eq!(updated.name, "Mills Ltd");
    assert_eq!(updated.phone, None);
    assert_eq!(updated.totals(), Totals::new(0, 60));

    let vendors = engine
        .list_counterparties(business_id, Some(CounterpartyKind::Vendor), "alice")
        .await
        .unwrap();
    assert_eq!(vendors.len(), 1);
    let customers = engine
        .list_counterparties(business_id, Some(CounterpartyKind::Customer), "alice")
        .await
        .unwrap();
    assert!(customers.is_empty());

    engine
        .delete_counterparty(business_id, vendor, "alice")
        .await
        .unwrap();

    let entry = engine.entry(business_id, entry_id, "alice").await.unwrap();
    assert_eq!(entry.counterparty_id, None);
    let book = engine.book(business_id, book_id, "alice").await.unwrap();
    assert_eq!(book.totals(), Totals::new(0, 60));
}

#[tokio::test]
async fn deleting_a_business_removes_everything() {
    let engine = engine_with_db().await;
    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();
    engine
        .add_entry(AddEntryCmd::cash_in(business_id, book_id, "alice", 5, Utc::now()))
        .await
        .unwrap();

    engine.delete_business(business_id, "alice").await.unwrap();

    let err = engine.business(business_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(engine.list_businesses("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn committed_changes_reach_subscribers() {
    let engine = engine_with_db().await;
    let mut feed = engine.subscribe();

    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();
    let entry_id = engine
        .add_entry(AddEntryCmd::cash_in(business_id, book_id, "alice", 250, Utc::now()))
        .await
        .unwrap();

    assert_eq!(feed.recv().await.unwrap().kind, LedgerEventKind::BusinessCreated);
    assert_eq!(
        feed.recv().await.unwrap().kind,
        LedgerEventKind::BookCreated { book_id }
    );
    let event = feed.recv().await.unwrap();
    assert_eq!(event.business_id, business_id);
    assert_eq!(event.actor, "alice");
    assert_eq!(
        event.kind,
        LedgerEventKind::EntryAdded {
            book_id,
            entry_id,
            direction: engine::Direction::In,
            amount_minor: 250,
        }
    );

    // Rejected operations publish nothing.
    let _ = engine
        .add_entry(AddEntryCmd::cash_in(business_id, book_id, "mallory", 1, Utc::now()))
        .await
        .unwrap_err();
    assert!(feed.try_recv().is_err());
}

#[tokio::test]
async fn other_members_are_notified() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::builder()
        .database(connect().await)
        .notifier(notifier.clone())
        .build()
        .await
        .unwrap();

    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "bob", Role::Viewer, "alice")
        .await
        .unwrap();
    engine
        .add_entry(AddEntryCmd::cash_out(business_id, book_id, "alice", 1_999, Utc::now()))
        .await
        .unwrap();

    let expected = "alice added a cash out entry of €19.99";
    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = notifier.sent.lock().unwrap().clone();
        if delivered.iter().any(|n| n.message == expected) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(
        delivered.iter().any(|n| n.message == expected),
        "{delivered:?}"
    );
    assert!(notifier.recipients().iter().all(|r| r == "bob"));
}

#[tokio::test]
async fn notifier_failures_do_not_fail_operations() {
    let engine = Engine::builder()
        .database(connect().await)
        .notifier(Arc::new(FailingNotifier))
        .build()
        .await
        .unwrap();

    let business_id = engine
        .create_business("Shop", Currency::Eur, "alice")
        .await
        .unwrap();
    engine
        .upsert_member(business_id, "bob", Role::Partner, "alice")
        .await
        .unwrap();
    let book_id = engine
        .create_book(business_id, "Main", "alice")
        .await
        .unwrap();
    engine
        .add_entry(AddEntryCmd::cash_in(business_id, book_id, "alice", 10, Utc::now()))
        .await
        .unwrap();

    let book = engine.book(business_id, book_id, "bob").await.unwrap();
    assert_eq!(book.totals(), Totals::new(10, 0));
}
