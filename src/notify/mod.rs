pub mod formatter;
pub mod sink;

pub use sink::{NotificationSink, ParseMode};
