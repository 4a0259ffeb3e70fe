/// Discrete user intents delivered to the tracking engine. Text commands and
/// button payloads both decode into these; nothing downstream sees raw payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    ShowMenu,
    /// "Add wallet" pressed without arguments; the next text is the wallet
    AwaitWalletInput,
    AddWalletRequested(String),
    /// Free text that is not a command
    PlainText(String),
    ListWallets,
    SelectWallet(String),
    RemoveWallet(String),
    StartTracking,
    StopTracking,
    Unknown(String),
}

const CB_ADD: &str = "add";
const CB_WALLETS: &str = "wallets";
const CB_TRACK: &str = "track";
const CB_STOP: &str = "stop";
const CB_MENU: &str = "menu";
const CB_SELECT: &str = "select:";
const CB_REMOVE: &str = "remove:";

/// Decodes a text message
pub fn parse_message(text: &str) -> BotEvent {
    let text = text.trim();
    if !text.starts_with('/') {
        return BotEvent::PlainText(text.to_string());
    }

    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };
    // Group chats address commands as /cmd@BotName
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "/start" | "/menu" => BotEvent::ShowMenu,
        "/add" if rest.is_empty() => BotEvent::AwaitWalletInput,
        "/add" => BotEvent::AddWalletRequested(rest.to_string()),
        "/wallets" => BotEvent::ListWallets,
        "/select" if !rest.is_empty() => BotEvent::SelectWallet(rest.to_string()),
        "/remove" if !rest.is_empty() => BotEvent::RemoveWallet(rest.to_string()),
        "/track" => BotEvent::StartTracking,
        "/stop" => BotEvent::StopTracking,
        _ => BotEvent::Unknown(text.to_string()),
    }
}

/// Decodes an inline button payload
pub fn parse_callback(data: &str) -> BotEvent {
    if let Some(address) = data.strip_prefix(CB_SELECT) {
        return BotEvent::SelectWallet(address.to_string());
    }
    if let Some(address) = data.strip_prefix(CB_REMOVE) {
        return BotEvent::RemoveWallet(address.to_string());
    }

    match data {
        CB_ADD => BotEvent::AwaitWalletInput,
        CB_WALLETS => BotEvent::ListWallets,
        CB_TRACK => BotEvent::StartTracking,
        CB_STOP => BotEvent::StopTracking,
        CB_MENU => BotEvent::ShowMenu,
        other => BotEvent::Unknown(other.to_string()),
    }
}

/// Encodes an event as a button payload; `None` for events buttons never carry
pub fn callback_data(event: &BotEvent) -> Option<String> {
    match event {
        BotEvent::AwaitWalletInput => Some(CB_ADD.to_string()),
        BotEvent::ListWallets => Some(CB_WALLETS.to_string()),
        BotEvent::StartTracking => Some(CB_TRACK.to_string()),
        BotEvent::StopTracking => Some(CB_STOP.to_string()),
        BotEvent::ShowMenu => Some(CB_MENU.to_string()),
        BotEvent::SelectWallet(address) => Some(format!("{}{}", CB_SELECT, address)),
        BotEvent::RemoveWallet(address) => Some(format!("{}{}", CB_REMOVE, address)),
        _ => None,
    }
}

/// Splits "address name" on the first whitespace run
pub fn parse_wallet_input(raw: &str) -> Option<(String, String)> {
    let (address, name) = raw.trim().split_once(char::is_whitespace)?;
    let name = name.trim();
    if address.is_empty() || name.is_empty() {
        return None;
    }
    Some((address.to_string(), name.to_string()))
}
