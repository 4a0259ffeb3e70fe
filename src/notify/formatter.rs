use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::rpc::TransactionDetail;

const LAMPORTS_DECIMALS: u32 = 9;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";
const UNKNOWN_TIME: &str = "Unknown Time";

/// Characters Telegram's MarkdownV2 reserves outside code spans
const MARKDOWN_V2_RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 1 SOL = 1e9 lamports, exact decimal arithmetic
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, LAMPORTS_DECIMALS)
}

/// SOL amount with exactly six decimal places
pub fn format_sol(lamports: u64) -> String {
    let sol = lamports_to_sol(lamports).round_dp(6);
    format!("{:.6}", sol)
}

pub fn format_time(time: DateTime<Utc>, offset: &FixedOffset) -> String {
    time.with_timezone(offset).format(TIME_FORMAT).to_string()
}

fn format_block_time(block_time: Option<i64>, offset: &FixedOffset) -> String {
    block_time
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|time| format_time(time, offset))
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}

/// Renders one notification for a transaction. Returns `None` when the
/// transaction has no native transfer; other instruction types are skipped.
pub fn render_transaction(
    wallet_name: &str,
    signature: &str,
    detail: &TransactionDetail,
    sent_at: DateTime<Utc>,
    offset: &FixedOffset,
) -> Option<String> {
    let transfers: Vec<_> = detail.instructions().iter().filter_map(|ix| ix.transfer()).collect();
    if transfers.is_empty() {
        return None;
    }

    let block_time = format_block_time(detail.block_time, offset);
    let sent_time = format_time(sent_at, offset);

    let mut message = format!(
        "Wallet: `{}`\nSignature: `{}`\n",
        escape_markdown(wallet_name),
        escape_markdown(signature)
    );

    for transfer in transfers {
        message.push_str(&format!(
            "Transaction Time: `{}`\n\
             Message Sent Time: `{}`\n\
             Type: `transfer`\n\
             From: `{}`\n\
             To: `{}`\n\
             Amount: `{} SOL`\n",
            block_time,
            sent_time,
            escape_markdown(&transfer.source),
            escape_markdown(&transfer.destination),
            format_sol(transfer.lamports),
        ));
    }

    Some(message)
}
