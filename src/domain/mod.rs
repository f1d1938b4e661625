pub mod error;
pub mod gateway;
pub mod id;
pub mod ledger;
pub mod money;
pub mod notify;
pub mod order;
pub mod payment;
pub mod store;
