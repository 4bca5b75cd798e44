use chrono::{Duration, Utc};
use sea_orm::Database;

use engine::{Currency, ExpenseDraft, Ledger, LedgerError, NewTransaction};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::new(db)
}

fn draft(user_id: &str, amount_minor: i64, currency: Currency, category: &str, item: &str) -> ExpenseDraft {
    ExpenseDraft {
        user_id: user_id.to_string(),
        user_name: "小明".to_string(),
        amount_minor,
        currency,
        category: category.to_string(),
        item: item.to_string(),
        raw_text: item.to_string(),
        created_at: None,
    }
}

fn new_tx(user_id: &str, amount_minor: i64) -> NewTransaction {
    NewTransaction {
        user_id: user_id.to_string(),
        user_name: "小明".to_string(),
        amount_minor,
        currency: Currency::Cny,
        category: "餐饮".to_string(),
        item: "买菜".to_string(),
        raw_text: "买菜 200".to_string(),
        created_at: None,
    }
}

#[tokio::test]
async fn pending_slot_is_last_write_wins() {
    let ledger = ledger_with_db().await;

    ledger
        .set_pending(draft("42", 5000, Currency::Cny, "交通", "打车"))
        .await
        .unwrap();
    ledger
        .set_pending(draft("42", 8000, Currency::Hkd, "交通", "打车"))
        .await
        .unwrap();

    let popped = ledger.pop_pending("42").await.unwrap().unwrap();
    assert_eq!(popped.amount_minor, 8000);
    assert_eq!(popped.currency, Currency::Hkd);
}

#[tokio::test]
async fn pop_is_destructive() {
    let ledger = ledger_with_db().await;

    ledger
        .set_pending(draft("42", 5000, Currency::Cny, "交通", "打车"))
        .await
        .unwrap();

    assert!(ledger.pop_pending("42").await.unwrap().is_some());
    assert!(ledger.pop_pending("42").await.unwrap().is_none());
}

#[tokio::test]
async fn pending_slots_are_isolated_per_user() {
    let ledger = ledger_with_db().await;

    ledger
        .set_pending(draft("42", 5000, Currency::Cny, "交通", "打车"))
        .await
        .unwrap();
    ledger
        .set_pending(draft("43", 900, Currency::Usdt, "其他", "gas fee"))
        .await
        .unwrap();

    assert!(ledger.pop_pending("42").await.unwrap().is_some());
    let other = ledger.pop_pending("43").await.unwrap().unwrap();
    assert_eq!(other.amount_minor, 900);
}

#[tokio::test]
async fn commit_flow_replaces_item_and_clears_slot() {
    let ledger = ledger_with_db().await;

    ledger
        .set_pending(draft("42", 8000, Currency::Hkd, "交通", "打车"))
        .await
        .unwrap();

    let popped = ledger.pop_pending("42").await.unwrap().unwrap();
    let committed = ledger
        .create_transaction(NewTransaction {
            user_id: popped.user_id,
            user_name: popped.user_name,
            amount_minor: popped.amount_minor,
            currency: popped.currency,
            category: popped.category,
            item: "去旺角地铁站".to_string(),
            raw_text: popped.raw_text,
            created_at: popped.created_at,
        })
        .await
        .unwrap();

    assert_eq!(committed.item, "去旺角地铁站");
    assert_eq!(committed.amount.minor(), 8000);
    assert_eq!(committed.currency, Currency::Hkd);
    assert_eq!(committed.category, "交通");
    assert!(ledger.pop_pending("42").await.unwrap().is_none());
}

#[tokio::test]
async fn create_assigns_ids_and_defaults_created_at() {
    let ledger = ledger_with_db().await;

    let before = Utc::now() - Duration::seconds(1);
    let tx = ledger.create_transaction(new_tx("42", 20_000)).await.unwrap();

    assert!(tx.id >= 1);
    assert!(tx.created_at >= before);
}

#[tokio::test]
async fn create_rejects_non_positive_amounts() {
    let ledger = ledger_with_db().await;

    let err = ledger.create_transaction(new_tx("42", 0)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn delete_requires_ownership() {
    let ledger = ledger_with_db().await;

    let tx = ledger.create_transaction(new_tx("42", 20_000)).await.unwrap();

    assert!(!ledger.delete_transaction_owned(tx.id, "43").await.unwrap());
    let listed = ledger.list_transactions(0, 10).await.unwrap();
    assert_eq!(listed.len(), 1);

    assert!(ledger.delete_transaction_owned(tx.id, "42").await.unwrap());
    assert!(ledger.list_transactions(0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_of_missing_record_reports_false() {
    let ledger = ledger_with_db().await;

    assert!(!ledger.delete_transaction_owned(999, "42").await.unwrap());
}

#[tokio::test]
async fn edit_rewrites_item_only() {
    let ledger = ledger_with_db().await;

    let tx = ledger.create_transaction(new_tx("42", 20_000)).await.unwrap();

    assert!(!ledger.update_item(tx.id, "43", "别人的").await.unwrap());
    assert!(ledger.update_item(tx.id, "42", "新项目").await.unwrap());

    let updated = ledger.most_recent("42").await.unwrap().unwrap();
    assert_eq!(updated.item, "新项目");
    assert_eq!(updated.amount, tx.amount);
    assert_eq!(updated.currency, tx.currency);
    assert_eq!(updated.category, tx.category);
    assert_eq!(updated.created_at, tx.created_at);
}

#[tokio::test]
async fn most_recent_picks_the_latest_per_user() {
    let ledger = ledger_with_db().await;
    let base = Utc::now();

    let mut older = new_tx("42", 1000);
    older.created_at = Some(base - Duration::minutes(5));
    ledger.create_transaction(older).await.unwrap();

    let mut newer = new_tx("42", 2000);
    newer.item = "午饭".to_string();
    newer.created_at = Some(base);
    ledger.create_transaction(newer).await.unwrap();

    let mut other_user = new_tx("43", 9000);
    other_user.created_at = Some(base + Duration::minutes(1));
    ledger.create_transaction(other_user).await.unwrap();

    let recent = ledger.most_recent("42").await.unwrap().unwrap();
    assert_eq!(recent.amount.minor(), 2000);
    assert_eq!(recent.item, "午饭");

    assert!(ledger.most_recent("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn undo_then_most_recent_moves_backwards() {
    let ledger = ledger_with_db().await;
    let base = Utc::now();

    let mut first = new_tx("42", 1000);
    first.created_at = Some(base - Duration::minutes(1));
    let first = ledger.create_transaction(first).await.unwrap();

    let mut second = new_tx("42", 2000);
    second.created_at = Some(base);
    let second = ledger.create_transaction(second).await.unwrap();

    ledger.delete_transaction(second.id).await.unwrap();
    let recent = ledger.most_recent("42").await.unwrap().unwrap();
    assert_eq!(recent.id, first.id);
}

#[tokio::test]
async fn list_orders_newest_first_and_paginates() {
    let ledger = ledger_with_db().await;
    let base = Utc::now();

    for (i, amount) in [1000, 2000, 3000].into_iter().enumerate() {
        let mut tx = new_tx("42", amount);
        tx.created_at = Some(base + Duration::minutes(i as i64));
        ledger.create_transaction(tx).await.unwrap();
    }

    let all = ledger.list_transactions(0, 10).await.unwrap();
    let amounts: Vec<i64> = all.iter().map(|tx| tx.amount.minor()).collect();
    assert_eq!(amounts, vec![3000, 2000, 1000]);

    let page = ledger.list_transactions(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].amount.minor(), 2000);
}

#[tokio::test]
async fn committed_transaction_shows_up_in_listing() {
    let ledger = ledger_with_db().await;

    ledger
        .set_pending(draft("42", 20_000, Currency::Cny, "餐饮", "买菜"))
        .await
        .unwrap();
    let popped = ledger.pop_pending("42").await.unwrap().unwrap();
    let committed = ledger
        .create_transaction(NewTransaction {
            user_id: popped.user_id,
            user_name: popped.user_name,
            amount_minor: popped.amount_minor,
            currency: popped.currency,
            category: popped.category,
            item: "超市采购".to_string(),
            raw_text: popped.raw_text,
            created_at: None,
        })
        .await
        .unwrap();

    let listed = ledger.list_transactions(0, 10).await.unwrap();
    assert!(listed.iter().any(|tx| tx.id == committed.id));
}

#[tokio::test]
async fn delete_all_counts_every_row() {
    let ledger = ledger_with_db().await;

    ledger.create_transaction(new_tx("42", 1000)).await.unwrap();
    ledger.create_transaction(new_tx("43", 2000)).await.unwrap();

    assert_eq!(ledger.delete_all_transactions().await.unwrap(), 2);
    assert!(ledger.list_transactions(0, 10).await.unwrap().is_empty());
}
