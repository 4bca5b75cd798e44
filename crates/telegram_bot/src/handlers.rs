use std::path::Path;

use engine::{ExpenseDraft, NewTransaction};
use teloxide::{
    net::Download,
    prelude::*,
    types::{ChatId, ForceReply, PhotoSize},
};

use crate::{
    ConfigParameters,
    commands::{self, Command},
    ui,
};

/// Stored as `raw_text` for drafts that came in as a photo.
const IMAGE_RAW_TEXT: &str = "[Image Receipt]";

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0.to_string();
    let user_name = from.first_name.clone();

    if let Some(photos) = msg.photo() {
        return handle_photo(&bot, &msg, &cfg, &user_id, &user_name, photos).await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(cmd) = commands::parse_command(text) {
        return handle_command(&bot, msg.chat.id, &cfg, &user_id, cmd).await;
    }

    handle_text(&bot, &msg, &cfg, &user_id, &user_name, text).await
}

/// Free text: either the item description for a pending draft, or a new
/// expense to extract.
async fn handle_text(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    user_id: &str,
    user_name: &str,
    text: &str,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    // Pop first: while a draft is pending, any text is its item description.
    let pending = match cfg.ledger.pop_pending(user_id).await {
        Ok(pending) => pending,
        Err(err) => {
            tracing::error!("failed to read pending draft for {user_id}: {err}");
            None
        }
    };
    if let Some(draft) = pending {
        return commit_draft(bot, chat_id, cfg, draft, text).await;
    }

    // A reply to our prompt whose draft is already gone means a duplicate
    // delivery: the pop is destructive and only the first copy commits.
    if msg.reply_to_message().is_some() {
        return Ok(());
    }

    let status = bot.send_message(chat_id, ui::ANALYZING_TEXT).await?;

    let fields = match cfg.extractor.extract_from_text(text).await {
        Ok(fields) => fields,
        Err(err) => {
            bot.edit_message_text(chat_id, status.id, ui::extract_error(&err))
                .await?;
            return Ok(());
        }
    };

    let draft = ExpenseDraft {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        amount_minor: fields.amount_minor,
        currency: fields.currency,
        category: fields.category,
        item: non_empty_or(fields.item, extraction::DEFAULT_ITEM),
        raw_text: text.to_string(),
        created_at: fields.created_at,
    };
    let preview = ui::draft_preview(&draft);

    if let Err(err) = cfg.ledger.set_pending(draft).await {
        tracing::error!("failed to store pending draft for {user_id}: {err}");
        bot.edit_message_text(chat_id, status.id, ui::save_failed(&err))
            .await?;
        return Ok(());
    }

    bot.edit_message_text(chat_id, status.id, ui::TEXT_DONE)
        .await?;
    bot.send_message(chat_id, preview)
        .reply_markup(ForceReply::new())
        .await?;
    Ok(())
}

async fn handle_photo(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    user_id: &str,
    user_name: &str,
    photos: &[PhotoSize],
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    // Telegram orders sizes smallest to largest.
    let Some(photo) = photos.last() else {
        return Ok(());
    };

    let status = bot.send_message(chat_id, ui::ANALYZING_IMAGE).await?;

    let path = std::env::temp_dir().join(format!("receipt_{}_{}.jpg", msg.chat.id.0, msg.id.0));
    let outcome = match download_photo(bot, photo, &path).await {
        Ok(()) => cfg.extractor.extract_from_image(&path).await,
        Err(reason) => {
            let _ = tokio::fs::remove_file(&path).await;
            bot.edit_message_text(chat_id, status.id, ui::image_failed(&reason))
                .await?;
            return Ok(());
        }
    };
    let _ = tokio::fs::remove_file(&path).await;

    let fields = match outcome {
        Ok(fields) => fields,
        Err(err) => {
            bot.edit_message_text(chat_id, status.id, ui::extract_error(&err))
                .await?;
            return Ok(());
        }
    };

    let draft = ExpenseDraft {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        amount_minor: fields.amount_minor,
        currency: fields.currency,
        category: fields.category,
        item: non_empty_or(fields.item, extraction::DEFAULT_ITEM),
        raw_text: IMAGE_RAW_TEXT.to_string(),
        created_at: fields.created_at,
    };
    let preview = ui::draft_preview(&draft);

    if let Err(err) = cfg.ledger.set_pending(draft).await {
        tracing::error!("failed to store pending draft for {user_id}: {err}");
        bot.edit_message_text(chat_id, status.id, ui::save_failed(&err))
            .await?;
        return Ok(());
    }

    bot.edit_message_text(chat_id, status.id, ui::IMAGE_DONE)
        .await?;
    bot.send_message(chat_id, preview)
        .reply_markup(ForceReply::new())
        .await?;
    Ok(())
}

/// Turns a popped draft plus the incoming text into a durable transaction.
///
/// The slot is already consumed: if the create fails the user re-enters the
/// expense from scratch.
async fn commit_draft(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    draft: ExpenseDraft,
    text: &str,
) -> ResponseResult<()> {
    let item = match text.trim() {
        "" => non_empty_or(draft.item.clone(), extraction::DEFAULT_ITEM),
        trimmed => trimmed.to_string(),
    };

    let new = NewTransaction {
        user_id: draft.user_id,
        user_name: draft.user_name,
        amount_minor: draft.amount_minor,
        currency: draft.currency,
        category: draft.category,
        item,
        raw_text: draft.raw_text,
        created_at: draft.created_at,
    };

    match cfg.ledger.create_transaction(new).await {
        Ok(tx) => {
            bot.send_message(chat_id, ui::saved(&tx)).await?;
        }
        Err(err) => {
            tracing::error!("failed to commit draft: {err}");
            bot.send_message(chat_id, ui::save_failed(&err)).await?;
        }
    }
    Ok(())
}

async fn handle_command(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    user_id: &str,
    cmd: Command,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(chat_id, ui::greeting()).await?;
        }
        Command::Undo => {
            let recent = match cfg.ledger.most_recent(user_id).await {
                Ok(recent) => recent,
                Err(err) => {
                    tracing::error!("undo lookup failed for {user_id}: {err}");
                    bot.send_message(chat_id, ui::undo_failed(&err)).await?;
                    return Ok(());
                }
            };
            let Some(tx) = recent else {
                bot.send_message(chat_id, ui::NOTHING_TO_UNDO).await?;
                return Ok(());
            };
            match cfg.ledger.delete_transaction(tx.id).await {
                Ok(()) => {
                    bot.send_message(chat_id, ui::undo_done(tx.id)).await?;
                }
                Err(err) => {
                    tracing::error!("undo delete failed for {user_id}: {err}");
                    bot.send_message(chat_id, ui::undo_failed(&err)).await?;
                }
            }
        }
        Command::Delete { args } => {
            let id = match commands::parse_delete_args(args.as_deref()) {
                Ok(id) => id,
                Err(usage) => {
                    bot.send_message(chat_id, usage).await?;
                    return Ok(());
                }
            };
            match cfg.ledger.delete_transaction_owned(id, user_id).await {
                Ok(true) => {
                    bot.send_message(chat_id, ui::delete_done(id)).await?;
                }
                Ok(false) => {
                    bot.send_message(chat_id, ui::DELETE_NOT_FOUND).await?;
                }
                Err(err) => {
                    tracing::error!("delete failed for {user_id}: {err}");
                    bot.send_message(chat_id, ui::delete_failed(&err)).await?;
                }
            }
        }
        Command::Edit { args } => {
            let (id, item) = match commands::parse_edit_args(args.as_deref()) {
                Ok(parsed) => parsed,
                Err(usage) => {
                    bot.send_message(chat_id, usage).await?;
                    return Ok(());
                }
            };
            match cfg.ledger.update_item(id, user_id, &item).await {
                Ok(true) => {
                    bot.send_message(chat_id, ui::edit_done(id, &item)).await?;
                }
                Ok(false) => {
                    bot.send_message(chat_id, ui::EDIT_NOT_FOUND).await?;
                }
                Err(err) => {
                    tracing::error!("edit failed for {user_id}: {err}");
                    bot.send_message(chat_id, ui::edit_failed(&err)).await?;
                }
            }
        }
        Command::Unknown(_) => {
            bot.send_message(chat_id, ui::UNKNOWN_COMMAND).await?;
        }
    }
    Ok(())
}

async fn download_photo(bot: &Bot, photo: &PhotoSize, dst: &Path) -> Result<(), String> {
    let file = bot
        .get_file(photo.file.id.clone())
        .await
        .map_err(|err| err.to_string())?;
    let mut out = tokio::fs::File::create(dst)
        .await
        .map_err(|err| err.to_string())?;
    bot.download_file(&file.path, &mut out)
        .await
        .map_err(|err| err.to_string())?;
    Ok(())
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
