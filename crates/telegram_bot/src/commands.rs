//! Slash-command parsing.
//!
//! Commands are parsed by hand so malformed arguments produce usage hints
//! instead of falling through to the extraction path.

/// Commands understood by the bot. Argument validation happens separately so
/// `/delete abc` still resolves to `Delete` and gets a usage message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Undo,
    Delete { args: Option<String> },
    Edit { args: Option<String> },
    Unknown(String),
}

pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    // Group chats address commands as /undo@BotName.
    let cmd = cmd.split('@').next().unwrap_or(cmd);

    match cmd {
        "/start" => Some(Command::Start),
        "/undo" => Some(Command::Undo),
        "/delete" => Some(Command::Delete { args }),
        "/edit" => Some(Command::Edit { args }),
        other => Some(Command::Unknown(other.to_string())),
    }
}

/// Validates `/delete <id>` arguments.
pub(crate) fn parse_delete_args(args: Option<&str>) -> Result<i64, &'static str> {
    let args = args.ok_or("用法: /delete 记录ID")?;
    args.split_whitespace()
        .next()
        .and_then(|id| id.parse().ok())
        .ok_or("记录ID必须是数字")
}

/// Validates `/edit <id> <new item>` arguments.
pub(crate) fn parse_edit_args(args: Option<&str>) -> Result<(i64, String), &'static str> {
    let args = args.ok_or("用法: /edit 记录ID 新项目名")?;

    let mut parts = args.splitn(2, char::is_whitespace);
    let id = parts
        .next()
        .ok_or("用法: /edit 记录ID 新项目名")?
        .parse()
        .map_err(|_| "记录ID必须是数字")?;
    let item = parts.next().map(str::trim).unwrap_or_default();
    if item.is_empty() {
        return Err("用法: /edit 记录ID 新项目名");
    }

    Ok((id, item.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("买菜 200"), None);
        assert_eq!(parse_command("  打车 50"), None);
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/undo"), Some(Command::Undo));
        assert_eq!(
            parse_command("/delete 5"),
            Some(Command::Delete {
                args: Some("5".to_string())
            })
        );
        assert_eq!(
            parse_command("/edit 5 新项目"),
            Some(Command::Edit {
                args: Some("5 新项目".to_string())
            })
        );
    }

    #[test]
    fn bot_mention_suffix_is_stripped() {
        assert_eq!(parse_command("/undo@LedgerBot"), Some(Command::Undo));
    }

    #[test]
    fn unknown_commands_are_flagged() {
        assert_eq!(
            parse_command("/udno"),
            Some(Command::Unknown("/udno".to_string()))
        );
    }

    #[test]
    fn delete_args_require_a_numeric_id() {
        assert_eq!(parse_delete_args(Some("5")), Ok(5));
        assert!(parse_delete_args(None).is_err());
        assert_eq!(parse_delete_args(Some("abc")), Err("记录ID必须是数字"));
    }

    #[test]
    fn edit_args_require_id_and_text() {
        assert_eq!(
            parse_edit_args(Some("5 新项目")),
            Ok((5, "新项目".to_string()))
        );
        assert_eq!(
            parse_edit_args(Some("5 早餐 两份")),
            Ok((5, "早餐 两份".to_string()))
        );
        assert!(parse_edit_args(None).is_err());
        assert!(parse_edit_args(Some("5")).is_err());
        assert_eq!(parse_edit_args(Some("abc 新项目")), Err("记录ID必须是数字"));
    }
}
