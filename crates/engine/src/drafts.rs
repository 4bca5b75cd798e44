//! In-flight expense drafts.
//!
//! A draft holds the extracted fields of an expense while the bot waits for
//! the user to supply the item description. Exactly one draft may exist per
//! user; writing a new one replaces any unread prior draft.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::Currency;

/// An unconfirmed expense awaiting its item description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseDraft {
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
#[sea_orm(table_name = "pending_drafts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub user_name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category: String,
    pub item: String,
    pub raw_text: String,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseDraft {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            user_name: model.user_name,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            category: model.category,
            item: model.item,
            raw_text: model.raw_text,
            created_at: model.created_at,
        }
    }
}
