pub(crate) mod holdings_errors;
pub(crate) mod holdings_model;
pub(crate) mod holdings_repository;
pub(crate) mod holdings_service;
pub(crate) mod holdings_traits;
pub(crate) mod ledger_calculator;

pub use holdings_errors::LedgerError;
pub use holdings_model::{
    Holding, LedgerTotals, NewTransaction, Transaction, TransactionUpdate, Wallet,
};
pub use holdings_repository::LedgerRepository;
pub use holdings_service::HoldingService;
pub use holdings_traits::{HoldingServiceTrait, LedgerRepositoryTrait};
pub use ledger_calculator::reconcile;
