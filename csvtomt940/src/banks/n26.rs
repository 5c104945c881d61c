use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

use super::{BankParser, ensure_chronological, field, truncate_payee};
use crate::error::ConvertError;
use crate::model::{Currency, GvcTable, MinorUnits, Money, Statement, Transaction};
use crate::utils::{parse_minor_units, split_iban};

const DATE_FORMAT: &str = "%Y-%m-%d";

// колонки выгрузки N26 с колонкой категории; дата валютирования (1) не используется
const DATE: usize = 0;
const PAYEE: usize = 2;
const TRANSACTION_TYPE: usize = 4;
const REFERENCE: usize = 5;
const CATEGORY: usize = 6;
const AMOUNT: usize = 7;

/// GVC-коды для типов операций N26 (английская и немецкая выгрузка)
pub fn default_gvc_table() -> GvcTable {
    [
        ("Income", "051"),
        ("Gutschrift", "051"),
        ("Credit Transfer", "051"),
        ("Outgoing Transfer", "020"),
        ("Überweisung", "020"),
        ("Debit Transfer", "020"),
        ("Presentment", "020"),
        ("Lastschrift", "005"),
        ("Direct Debit", "005"),
        // поступления на карту
        ("MasterCard Payment Credit", "051"),
        ("MasterCard Zahlung Credit", "051"),
        // списания с карты
        ("MasterCard Payment Debit", "004"),
        ("MasterCard Zahlung Debit", "004"),
        // кэшбэк
        ("N26 Empfehlung", "051"),
        ("Reward", "051"),
        ("N26 Referral", "051"),
        ("Fee", "808"),
        ("Presentment Refund", "059"),
    ]
    .into_iter()
    .collect()
}

/// Выгрузка N26: UTF-8, разделитель `,`, одна строка заголовков, операции от старых к новым.
///
/// Ни IBAN, ни остатков в выгрузке нет: IBAN и начальный остаток задаёт вызывающий,
/// остаток после каждой операции накапливается по ходу чтения. Валюта всегда EUR.
#[derive(Debug, Clone)]
pub struct N26 {
    iban: String,
    /// остаток до первой операции, в центах
    start_balance: MinorUnits,
    has_category: bool,
    gvc_table: GvcTable,
}

impl N26 {
    pub fn new(iban: impl Into<String>, start_balance: MinorUnits, has_category: bool) -> Self {
        N26 {
            iban: iban.into(),
            start_balance,
            has_category,
            gvc_table: default_gvc_table(),
        }
    }

    pub fn with_gvc_table(mut self, gvc_table: GvcTable) -> Self {
        self.gvc_table = gvc_table;
        self
    }

    /// Строит операцию; `previous`: остаток до неё
    fn transaction_from_record(
        &self,
        row: &StringRecord,
        previous: &Money,
    ) -> Result<Transaction, ConvertError> {
        let date = NaiveDate::parse_from_str(field(row, DATE)?, DATE_FORMAT)?;

        let amount_col = if self.has_category { AMOUNT } else { AMOUNT - 1 };
        let amount = Money::new(
            parse_minor_units(&normalize_amount(field(row, amount_col)?))?,
            Currency::EUR,
        );
        let balance = previous.checked_add(&amount)?;

        let transaction_type = field(row, TRANSACTION_TYPE)?;
        let mut tx = Transaction::new(date, transaction_type, amount, balance)
            .with_payee(truncate_payee(field(row, PAYEE)?))
            .with_reference(field(row, REFERENCE)?);

        if let Some(key) = card_payment_key(transaction_type, &tx.amount) {
            tx = tx.with_gvc_key(key);
        }
        if self.has_category {
            tx = tx.with_category(field(row, CATEGORY)?);
        }

        Ok(tx)
    }
}

impl BankParser for N26 {
    fn name(&self) -> &'static str {
        "N26"
    }

    fn gvc_table(&self) -> &GvcTable {
        &self.gvc_table
    }

    fn parse<R: Read>(&self, reader: R) -> Result<Statement, ConvertError> {
        let (bank_number, account_number) = split_iban(&self.iban)?;

        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut balance = Money::new(self.start_balance, Currency::EUR);
        let mut transactions = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let row = result?;

            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let tx = self
                .transaction_from_record(&row, &balance)
                .map_err(|e| e.in_row(idx + 1))?;
            balance = tx.balance.clone();
            transactions.push(tx);
        }

        ensure_chronological(&transactions)?;

        debug!(
            bank = self.name(),
            %bank_number,
            %account_number,
            transactions = transactions.len(),
            closing_balance = %balance,
            "read N26 export"
        );

        Ok(Statement::new(bank_number, account_number, transactions))
    }
}

/// Доводит дробную часть суммы N26 до двух знаков: "12.5" -> "12.50", "12" -> "12.00"
fn normalize_amount(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    match raw.split_once('.') {
        None => format!("{raw}.00"),
        Some((_, frac)) if frac.is_empty() => format!("{raw}00"),
        Some((_, frac)) if frac.len() == 1 => format!("{raw}0"),
        Some(_) => raw.to_string(),
    }
}

/// Операции по карте выгружаются одним типом, а GVC-коды у списания и поступления разные
fn card_payment_key(transaction_type: &str, amount: &Money) -> Option<String> {
    if transaction_type != "MasterCard Payment" && transaction_type != "MasterCard Zahlung" {
        return None;
    }

    let side = if amount.is_negative() { "Debit" } else { "Credit" };
    Some(format!("{transaction_type} {side}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IBAN: &str = "DE22 1111 1111 0000 0000 00";

    fn eur(amount: MinorUnits) -> Money {
        Money::new(amount, Currency::EUR)
    }

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn normalize_amount_pads_fraction() {
        assert_eq!(normalize_amount("12.5"), "12.50");
        assert_eq!(normalize_amount("-12.5"), "-12.50");
        assert_eq!(normalize_amount("12.00"), "12.00");
        assert_eq!(normalize_amount("12"), "12.00");
        assert_eq!(normalize_amount("12."), "12.00");
        assert_eq!(normalize_amount(""), "");
    }

    #[test]
    fn card_payment_is_split_by_sign() {
        assert_eq!(
            card_payment_key("MasterCard Payment", &eur(1200)).as_deref(),
            Some("MasterCard Payment Credit")
        );
        assert_eq!(
            card_payment_key("MasterCard Zahlung", &eur(-1)).as_deref(),
            Some("MasterCard Zahlung Debit")
        );
        assert_eq!(card_payment_key("Income", &eur(-1)), None);
    }

    #[test]
    fn record_fields_are_mapped() {
        let bank = N26::new(IBAN, 0, true);
        let r = row(&[
            "2000-01-02",
            "2000-01-02",
            "test",
            "DE00",
            "Income",
            "reference",
            "Salary",
            "12.00",
            "",
            "",
            "",
        ]);
        let tx = bank.transaction_from_record(&r, &eur(0)).unwrap();

        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2000, 1, 2).unwrap());
        assert_eq!(tx.value_date, tx.date);
        assert_eq!(tx.payee, "test");
        assert_eq!(tx.transaction_type, "Income");
        assert_eq!(tx.reference, "reference");
        assert_eq!(tx.category, "Salary");
        assert_eq!(tx.amount, eur(1200));
        assert_eq!(tx.balance, eur(1200));
        assert_eq!(tx.gvc_key, None);
    }

    #[test]
    fn record_without_category_reads_amount_one_column_earlier() {
        let bank = N26::new(IBAN, 0, false);
        let r = row(&[
            "2000-01-02",
            "2000-01-02",
            "shop",
            "",
            "MasterCard Payment",
            "",
            "-3.5",
            "",
            "",
            "",
        ]);
        let tx = bank.transaction_from_record(&r, &eur(1000)).unwrap();

        assert_eq!(tx.amount, eur(-350));
        assert_eq!(tx.balance, eur(650));
        assert_eq!(tx.category, "");
        assert_eq!(tx.gvc_lookup_key(), "MasterCard Payment Debit");
    }

    #[test]
    fn record_with_bad_values_fails() {
        let bank = N26::new(IBAN, 0, true);

        let bad_date = row(&["2000-0102", "", "", "", "", "", "", "", "", "", ""]);
        assert!(matches!(
            bank.transaction_from_record(&bad_date, &eur(0)),
            Err(ConvertError::Date(_))
        ));

        let bad_amount = row(&["2000-01-02", "", "", "", "", "", "", "12-00", "", "", ""]);
        assert!(matches!(
            bank.transaction_from_record(&bad_amount, &eur(0)),
            Err(ConvertError::InvalidAmount(_))
        ));
    }

    #[test]
    fn balance_is_accumulated_from_start_balance() {
        let csv = "\
\"Booking Date\",\"Value Date\",\"Partner Name\",\"Partner Iban\",\"Type\",\"Payment Reference\",\"Category\",\"Amount (EUR)\",\"Original Amount\",\"Original Currency\",\"Exchange Rate\"
\"2020-01-02\",\"2020-01-02\",\"ACME\",\"\",\"Income\",\"Salary\",\"Income\",\"100.0\",\"\",\"\",\"\"
\"2020-01-03\",\"2020-01-03\",\"Shop\",\"\",\"MasterCard Payment\",\"\",\"Food\",\"-25.5\",\"\",\"\",\"\"
";
        let statement = N26::new(IBAN, 1_000, true).parse(csv.as_bytes()).unwrap();

        assert_eq!(statement.bank_number, "11111111");
        assert_eq!(statement.account_number, "0000000000");

        let balances: Vec<_> = statement.transactions.iter().map(|t| t.balance.amount).collect();
        assert_eq!(balances, vec![11_000, 8_450]);
    }

    #[test]
    fn invalid_iban_fails_before_reading() {
        let err = N26::new("nope", 0, true).parse("".as_bytes()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidIban(_)));
    }

    #[test]
    fn unordered_export_is_rejected() {
        let csv = "\
Date,Value,Payee,Account,Type,Reference,Category,Amount
2020-01-05,2020-01-05,A,,Income,,,1.00
2020-01-02,2020-01-02,B,,Income,,,1.00
";
        let err = N26::new(IBAN, 0, true).parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ConvertError::UnorderedTransactions { index: 2 }));
    }
}
