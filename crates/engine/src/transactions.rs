//! Durable expense records.
//!
//! A `Transaction` is born from a committed draft (see `ExpenseDraft`) and is
//! owned by the user who created it; mutation and deletion require the
//! stored `user_id` to match.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Currency, Money};

/// A committed expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub amount: Money,
    pub currency: Currency,
    pub category: String,
    pub item: String,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a record about to be committed.
///
/// `created_at` is optional; the ledger stamps the commit time when absent
/// (receipt photos may carry their own date).
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub user_id: String,
    pub user_name: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub category: String,
    pub item: String,
    pub raw_text: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category: String,
    pub item: String,
    pub raw_text: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            user_name: model.user_name,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            category: model.category,
            item: model.item,
            raw_text: model.raw_text,
            created_at: model.created_at,
        }
    }
}
