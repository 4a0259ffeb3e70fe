pub mod client;
pub mod models;

pub use client::{ChainRpc, SolanaRpcClient};
pub use models::TransactionDetail;
