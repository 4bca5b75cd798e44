//! Telegram bot.
//!
//! The conversational front end: routes incoming messages through the
//! draft/commit state machine, calling the extraction adapter and the ledger
//! directly. Per-user isolation comes from keying both stores by the
//! Telegram user id; the dispatcher runs handlers concurrently, so a slow
//! model call for one user never blocks another user's messages.

use std::sync::Arc;

use engine::Ledger;
use extraction::Extractor;
use teloxide::prelude::*;

mod commands;
mod handlers;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    ledger: Arc<Ledger>,
    extractor: Arc<Extractor>,
}

pub struct Bot {
    token: String,
    ledger: Arc<Ledger>,
    extractor: Arc<Extractor>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            ledger: self.ledger.clone(),
            extractor: self.extractor.clone(),
        };

        let handler =
            dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    ledger: Option<Arc<Ledger>>,
    extractor: Option<Arc<Extractor>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn ledger(mut self, ledger: Arc<Ledger>) -> BotBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn extractor(mut self, extractor: Arc<Extractor>) -> BotBuilder {
        self.extractor = Some(extractor);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");

        if self.token.is_empty() {
            return Err("missing telegram token".to_string());
        }
        let ledger = self.ledger.ok_or_else(|| "missing ledger".to_string())?;
        let extractor = self
            .extractor
            .ok_or_else(|| "missing extractor".to_string())?;

        Ok(Bot {
            token: self.token,
            ledger,
            extractor,
        })
    }
}
