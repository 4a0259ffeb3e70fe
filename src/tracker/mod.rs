pub mod cache;
pub mod manager;
pub mod models;
pub mod poller;
pub mod registry;

pub use cache::DetailCache;
pub use manager::TaskManager;
pub use models::ChatId;
pub use registry::WalletRegistry;
