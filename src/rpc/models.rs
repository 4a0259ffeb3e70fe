use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// One entry of a `getSignaturesForAddress` result; slot, block time and
/// status are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureRecord {
    pub signature: String,
}

/// `getTransaction` result in `jsonParsed` encoding. Only the fields the
/// tracker reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionDetail {
    #[serde(rename = "blockTime", default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub transaction: TransactionBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<InstructionRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstructionRecord {
    /// Absent for instructions the node could not parse, a plain string for
    /// some programs (memo), an object with `type` and `info` otherwise.
    #[serde(default)]
    pub parsed: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedInstruction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub info: Value,
}

/// Native SOL transfer as reported by the system program parser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferInfo {
    pub source: String,
    pub destination: String,
    pub lamports: u64,
}

impl InstructionRecord {
    pub fn parsed_instruction(&self) -> Option<ParsedInstruction> {
        let parsed = self.parsed.as_ref()?;
        serde_json::from_value(parsed.clone()).ok()
    }

    /// Returns the transfer payload when this is a native transfer
    pub fn transfer(&self) -> Option<TransferInfo> {
        let parsed = self.parsed_instruction()?;
        if parsed.kind != "transfer" {
            return None;
        }
        serde_json::from_value(parsed.info).ok()
    }
}

impl TransactionDetail {
    pub fn instructions(&self) -> &[InstructionRecord] {
        &self.transaction.message.instructions
    }
}
