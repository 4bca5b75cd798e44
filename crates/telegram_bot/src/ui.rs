//! Message rendering.
//!
//! Pure text helpers so handler flow stays readable. Timestamps are shown in
//! the family's home timezone.

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;
use engine::{ExpenseDraft, LedgerError, Money, Transaction};
use extraction::ExtractError;

pub(crate) const ANALYZING_TEXT: &str = "⏳ 正在分析...";
pub(crate) const ANALYZING_IMAGE: &str = "📸 正在识别图片...";
pub(crate) const TEXT_DONE: &str = "文本识别完成，等待填写项目...";
pub(crate) const IMAGE_DONE: &str = "图片识别完成，等待填写项目...";
pub(crate) const NOT_A_BILL: &str = "🤔 这看起来不像是一笔账单。请再说具体点？";
pub(crate) const NOTHING_TO_UNDO: &str = "没有可撤回的记录";
pub(crate) const DELETE_NOT_FOUND: &str = "未找到该记录或无权限删除";
pub(crate) const EDIT_NOT_FOUND: &str = "未找到该记录或无权限修改";
pub(crate) const UNKNOWN_COMMAND: &str = "未知命令，发送 /start 查看用法";

pub(crate) fn greeting() -> &'static str {
    "👋 嗨！我是你的家庭记账助手。\n请直接发送消费内容，例如：\n“买菜 200 HKD” 或 “打车 50”（默认 CNY）\n也可以直接发送小票图片！"
}

/// Preview shown once a draft is stored, asking for the item description.
pub(crate) fn draft_preview(draft: &ExpenseDraft) -> String {
    format!(
        "预览：{amount}，{category}\n请回复本次消费的项目（例如：转账给XX、在XX购物）",
        amount = Money::new(draft.amount_minor).format(draft.currency),
        category = draft.category,
    )
}

/// Confirmation with the record id and the correction commands.
pub(crate) fn saved(tx: &Transaction) -> String {
    format!(
        "✅ 已记录 #{id}\n💰 {amount}\n📂 {category} - {item}\n🕐 {time}\n\n操作：/undo 撤回最近一条；/delete {id} 删除；/edit {id} 新项目名",
        id = tx.id,
        amount = tx.amount.format(tx.currency),
        category = tx.category,
        item = tx.item,
        time = format_time(tx.created_at),
    )
}

pub(crate) fn extract_error(err: &ExtractError) -> String {
    match err {
        ExtractError::NotAnExpense => NOT_A_BILL.to_string(),
        ExtractError::NoApiKey => "未配置识别模型，暂时无法识别图片小票。".to_string(),
        ExtractError::NoAmountFound => "没有找到金额，请带上数字再试一次。".to_string(),
        ExtractError::VisionParse(reason) => {
            format!("🤔 无法识别账单信息。\n错误: {reason}")
        }
        ExtractError::ModelCall(reason) => format!("❌ 处理出错: {reason}"),
    }
}

pub(crate) fn save_failed(err: &LedgerError) -> String {
    format!("❌ 保存失败: {err}")
}

pub(crate) fn image_failed(reason: &str) -> String {
    format!("❌ 图片处理出错: {reason}")
}

pub(crate) fn undo_done(id: i64) -> String {
    format!("已撤回记录 #{id}")
}

pub(crate) fn undo_failed(err: &LedgerError) -> String {
    format!("撤回失败: {err}")
}

pub(crate) fn delete_done(id: i64) -> String {
    format!("已删除记录 #{id}")
}

pub(crate) fn delete_failed(err: &LedgerError) -> String {
    format!("删除失败: {err}")
}

pub(crate) fn edit_done(id: i64, item: &str) -> String {
    format!("已更新记录 #{id} 项目为：{item}")
}

pub(crate) fn edit_failed(err: &LedgerError) -> String {
    format!("修改失败: {err}")
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Shanghai).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Currency;

    fn sample_tx() -> Transaction {
        Transaction {
            id: 7,
            user_id: "42".to_string(),
            user_name: "小明".to_string(),
            amount: Money::new(8000),
            currency: Currency::Hkd,
            category: "交通".to_string(),
            item: "去旺角地铁站".to_string(),
            raw_text: "打车去旺角 80".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn saved_includes_id_amount_and_hints() {
        let text = saved(&sample_tx());
        assert!(text.contains("#7"));
        assert!(text.contains("80.00 HKD"));
        assert!(text.contains("/undo"));
        assert!(text.contains("/delete 7"));
        assert!(text.contains("/edit 7"));
    }

    #[test]
    fn preview_formats_money_with_currency() {
        let draft = ExpenseDraft {
            user_id: "42".to_string(),
            user_name: "小明".to_string(),
            amount_minor: 20_000,
            currency: Currency::Cny,
            category: "餐饮".to_string(),
            item: "买菜".to_string(),
            raw_text: "买菜 200".to_string(),
            created_at: None,
        };
        let text = draft_preview(&draft);
        assert!(text.contains("200.00 CNY"));
        assert!(text.contains("餐饮"));
    }
}
