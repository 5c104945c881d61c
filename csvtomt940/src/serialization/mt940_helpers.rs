use chrono::NaiveDate;

use crate::error::ConvertError;
use crate::model::{Money, Transaction};
use crate::utils::{credit_or_debit, format_money};

/// Форматируем дату как YYMMDD для MT940
pub(super) fn format_yymmdd(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Строка :25: с кодом банка и номером счёта
pub(super) fn format_account_line(
    bank_number: &str,
    account_number: &str,
) -> Result<String, ConvertError> {
    if bank_number.is_empty() {
        return Err(ConvertError::MissingIdentifier("bankNumber"));
    }
    if account_number.is_empty() {
        return Err(ConvertError::MissingIdentifier("accountNumber"));
    }

    Ok(format!(":25:{bank_number}/{account_number}\r\n"))
}

/// Строка баланса без перевода строки: `:<tag>:<C|D><YYMMDD><валюта><сумма>`
pub(super) fn format_balance_line(tag: &str, balance: &Money, date: NaiveDate) -> String {
    format!(
        ":{tag}:{}{}{}{}",
        credit_or_debit(balance.amount),
        format_yymmdd(date),
        balance.currency.code(),
        format_money(balance.amount),
    )
}

/// :60F: остаток до первой операции, считается как `balance - amount` первой операции
pub(super) fn format_opening_balance_line(
    transactions: &[Transaction],
) -> Result<String, ConvertError> {
    let first = transactions
        .first()
        .ok_or(ConvertError::EmptyStatement("opening balance"))?;

    let opening = first.balance.checked_sub(&first.amount)?;

    Ok(format!("{}\r\n", format_balance_line("60F", &opening, first.date)))
}

/// :62F: остаток после последней операции, берётся как есть
pub(super) fn format_closing_balance_line(
    transactions: &[Transaction],
) -> Result<String, ConvertError> {
    let last = transactions
        .last()
        .ok_or(ConvertError::EmptyStatement("closing balance"))?;

    Ok(format_balance_line("62F", &last.balance, last.date))
}

/// Форматируем одну строку :61: из Transaction
///
/// `:61:<дата валютирования YYMMDD><дата проводки MMDD><C|D><сумма>NTRFNONREF`
pub(super) fn format_61_line(tx: &Transaction) -> String {
    format!(
        ":61:{}{}{}{}NTRFNONREF\r\n",
        format_yymmdd(tx.value_date),
        tx.date.format("%m%d"),
        credit_or_debit(tx.amount.amount),
        format_money(tx.amount.amount),
    )
}
