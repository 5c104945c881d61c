//! Конвертация CSV-выгрузок банков в выписки MT940 (.sta).
//!
//! Адаптер банка ([`BankParser`]) читает выгрузку в [`Statement`],
//! а [`Statement::write_mt940`] пишет её в MT940 с GVC-кодами этого банка.

pub mod banks;
pub mod error;
pub mod model;
pub mod serialization;
pub mod utils;

pub use crate::banks::{BankParser, ing::Ing, n26::N26};
pub use crate::error::ConvertError;
pub use crate::model::{Currency, GvcTable, MinorUnits, Money, Statement, Transaction};
