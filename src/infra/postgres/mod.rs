pub mod ledger_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod store;
