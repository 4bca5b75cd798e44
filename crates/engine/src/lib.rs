//! Ledger core: durable transactions plus per-user pending drafts.
//!
//! The two stores share one database connection. Transactions are
//! append-only by default, with point deletes and an ownership check on
//! mutation. Pending drafts are a single slot per user: `set_pending`
//! replaces whatever was there, `pop_pending` consumes the slot.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};

pub use currency::Currency;
pub use drafts::ExpenseDraft;
pub use error::LedgerError;
pub use money::Money;
pub use transactions::{NewTransaction, Transaction};

mod currency;
mod drafts;
mod error;
mod money;
mod transactions;

type ResultLedger<T> = Result<T, LedgerError>;

#[derive(Clone, Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Commits a new transaction, assigning its id and defaulting
    /// `created_at` to now when the caller did not supply one.
    pub async fn create_transaction(&self, new: NewTransaction) -> ResultLedger<Transaction> {
        if new.amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let model = transactions::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(new.user_id),
            user_name: ActiveValue::Set(new.user_name),
            amount_minor: ActiveValue::Set(new.amount_minor),
            currency: ActiveValue::Set(new.currency.code().to_string()),
            category: ActiveValue::Set(new.category),
            item: ActiveValue::Set(new.item),
            raw_text: ActiveValue::Set(new.raw_text),
            created_at: ActiveValue::Set(new.created_at.unwrap_or_else(Utc::now)),
        };

        let model = model.insert(&self.database).await?;
        Ok(Transaction::from(model))
    }

    /// Lists transactions newest first. `created_at` orders the page, with
    /// the id as tiebreaker so same-second records page deterministically.
    pub async fn list_transactions(&self, offset: u64, limit: u64) -> ResultLedger<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(Transaction::from).collect())
    }

    /// Returns the most recently created transaction of a user, if any.
    pub async fn most_recent(&self, user_id: &str) -> ResultLedger<Option<Transaction>> {
        let model = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .one(&self.database)
            .await?;

        Ok(model.map(Transaction::from))
    }

    /// Deletes a transaction by id, without an ownership check. Callers are
    /// expected to have resolved the id through an ownership-scoped query
    /// (e.g. `most_recent`).
    pub async fn delete_transaction(&self, id: i64) -> ResultLedger<()> {
        let res = transactions::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;

        if res.rows_affected == 0 {
            return Err(LedgerError::KeyNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Ownership-checked delete.
    ///
    /// Returns `false` when the record does not exist or belongs to another
    /// user; the two cases are indistinguishable on purpose so callers can't
    /// probe for other users' record ids.
    pub async fn delete_transaction_owned(&self, id: i64, user_id: &str) -> ResultLedger<bool> {
        let res = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;

        Ok(res.rows_affected > 0)
    }

    /// Deletes every transaction and returns how many were removed.
    pub async fn delete_all_transactions(&self) -> ResultLedger<u64> {
        let res = transactions::Entity::delete_many()
            .exec(&self.database)
            .await?;

        Ok(res.rows_affected)
    }

    /// Rewrites the item description of an owned transaction. All other
    /// fields are left untouched. Same `false` semantics as
    /// [`delete_transaction_owned`](Self::delete_transaction_owned).
    pub async fn update_item(&self, id: i64, user_id: &str, new_item: &str) -> ResultLedger<bool> {
        let res = transactions::Entity::update_many()
            .col_expr(transactions::Column::Item, Expr::value(new_item))
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;

        Ok(res.rows_affected > 0)
    }

    /// Stores a pending draft for its user, replacing any existing one
    /// (last write wins).
    pub async fn set_pending(&self, draft: ExpenseDraft) -> ResultLedger<()> {
        let db_tx = self.database.begin().await?;

        drafts::Entity::delete_by_id(draft.user_id.clone())
            .exec(&db_tx)
            .await?;

        let model = drafts::ActiveModel {
            user_id: ActiveValue::Set(draft.user_id),
            user_name: ActiveValue::Set(draft.user_name),
            amount_minor: ActiveValue::Set(draft.amount_minor),
            currency: ActiveValue::Set(draft.currency.code().to_string()),
            category: ActiveValue::Set(draft.category),
            item: ActiveValue::Set(draft.item),
            raw_text: ActiveValue::Set(draft.raw_text),
            created_at: ActiveValue::Set(draft.created_at),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        model.insert(&db_tx).await?;

        db_tx.commit().await?;
        Ok(())
    }

    /// Atomically reads and clears a user's pending draft.
    ///
    /// Once popped the slot is empty: a concurrent duplicate delivery gets
    /// `None` and must no-op. The slot is not restored if the subsequent
    /// commit fails.
    pub async fn pop_pending(&self, user_id: &str) -> ResultLedger<Option<ExpenseDraft>> {
        let db_tx = self.database.begin().await?;

        let Some(model) = drafts::Entity::find_by_id(user_id.to_string())
            .one(&db_tx)
            .await?
        else {
            db_tx.commit().await?;
            return Ok(None);
        };

        drafts::Entity::delete_by_id(user_id.to_string())
            .exec(&db_tx)
            .await?;

        db_tx.commit().await?;
        Ok(Some(ExpenseDraft::from(model)))
    }
}
