pub mod log_notifier;
pub mod postgres;
