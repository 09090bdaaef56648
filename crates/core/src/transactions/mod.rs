//! Transactions module - headers, numbering, validation and search.

mod transactions_model;
mod transactions_service;
mod transactions_traits;


pub use transactions_model::{
    next_transaction_number, NewTransaction, Transaction, TransactionDetails, TransactionDraft,
    TransactionPage, TransactionQuery, TransactionUpdate,
};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
