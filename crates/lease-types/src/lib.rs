pub mod types;

pub use types::{
    ApplicationRecord, BankAccount, Director, EquipmentItem, FinanceTerms, Guarantor,
};
