//! Entries module - ledger entries and the balance bookkeeping around them.

mod entries_model;
mod entries_service;
mod entries_traits;


pub(crate) use entries_service::clean_reference;

pub use entries_model::{
    build_register, check_entry_draft, merge_adjustments, plan_entry_change,
    plan_transaction_creation, plan_transaction_removal, touched_accounts, BalanceAdjustment,
    Entry, EntrySide, EntryUpdate, EntryWithTransaction, NewEntry, RegisterLine, RegisterPage,
};
pub use entries_service::EntryService;
pub use entries_traits::{EntryRepositoryTrait, EntryServiceTrait};
