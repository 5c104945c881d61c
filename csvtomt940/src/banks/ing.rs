use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;
use std::io::Read;
use tracing::{debug, warn};

use super::{BankParser, ensure_chronological, field, truncate_payee};
use crate::error::ConvertError;
use crate::model::{Currency, GvcTable, Money, Statement, Transaction};
use crate::utils::{parse_minor_units, split_iban};

/// Строк в мета-блоке перед таблицей операций
const META_BLOCK_LINES: usize = 13;
const DATE_FORMAT: &str = "%d.%m.%Y";

// колонки выгрузки ING с колонкой категории
const DATE: usize = 0;
const VALUE_DATE: usize = 1;
const PAYEE: usize = 2;
const TRANSACTION_TYPE: usize = 3;
const CATEGORY: usize = 4;
const REFERENCE: usize = 5;
const BALANCE: usize = 6;
const BALANCE_CURRENCY: usize = 7;
const AMOUNT: usize = 8;
const AMOUNT_CURRENCY: usize = 9;

/// GVC-коды для "Buchungstext" ING. Список неполный, в выгрузке бывают и другие значения.
pub fn default_gvc_table() -> GvcTable {
    [
        ("Abschluss", "805"),
        ("Gutschrift aus Dauerauftrag", "052"),
        ("Abbuchung", "004"),
        ("Lastschrift", "005"),
        ("Gutschrift", "051"),
        ("Gehalt/Rente", "053"),
        ("Überweisung", "020"),
        ("Entgelt", "808"),
        ("Retouren", "059"),
        ("Dauerauftrag / Terminueberweisung", "008"),
    ]
    .into_iter()
    .collect()
}

/// Выгрузка ING (ING-DiBa): ISO-8859-1, разделитель `;`,
/// 13 строк мета-информации, операции от новых к старым, остаток в каждой строке.
#[derive(Debug, Clone)]
pub struct Ing {
    /// есть ли колонка "Kategorie" (в старых выгрузках её нет)
    has_category: bool,
    /// IBAN вместо найденного в мета-блоке
    iban: Option<String>,
    gvc_table: GvcTable,
}

impl Ing {
    pub fn new(has_category: bool) -> Self {
        Ing {
            has_category,
            iban: None,
            gvc_table: default_gvc_table(),
        }
    }

    /// Берёт код банка и номер счёта из этого IBAN, а не из мета-блока
    pub fn with_iban(mut self, iban: impl Into<String>) -> Self {
        self.iban = Some(iban.into());
        self
    }

    pub fn with_gvc_table(mut self, gvc_table: GvcTable) -> Self {
        self.gvc_table = gvc_table;
        self
    }

    /// Индекс колонки с учётом отсутствующей категории
    fn column(&self, col: usize) -> usize {
        if self.has_category || col < CATEGORY {
            col
        } else {
            col - 1
        }
    }

    fn transaction_from_record(&self, row: &StringRecord) -> Result<Transaction, ConvertError> {
        let date = NaiveDate::parse_from_str(field(row, DATE)?, DATE_FORMAT)?;
        let value_date = NaiveDate::parse_from_str(field(row, VALUE_DATE)?, DATE_FORMAT)?;

        let balance = Money::new(
            parse_minor_units(field(row, self.column(BALANCE))?)?,
            Currency::from_code(field(row, self.column(BALANCE_CURRENCY))?),
        );
        let amount = Money::new(
            parse_minor_units(field(row, self.column(AMOUNT))?)?,
            Currency::from_code(field(row, self.column(AMOUNT_CURRENCY))?),
        );

        let mut tx = Transaction::new(date, field(row, TRANSACTION_TYPE)?, amount, balance)
            .with_value_date(value_date)
            .with_payee(truncate_payee(field(row, PAYEE)?))
            .with_reference(field(row, self.column(REFERENCE))?);

        if self.has_category {
            tx = tx.with_category(field(row, CATEGORY)?);
        }

        Ok(tx)
    }
}

impl BankParser for Ing {
    fn name(&self) -> &'static str {
        "ING"
    }

    fn gvc_table(&self) -> &GvcTable {
        &self.gvc_table
    }

    fn parse<R: Read>(&self, mut reader: R) -> Result<Statement, ConvertError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        // ING выгружает в ISO-8859-1, windows-1252 его надмножество
        let (text, _, had_errors) = WINDOWS_1252.decode(&bytes);
        if had_errors {
            warn!(bank = self.name(), "export contains undecodable bytes, replaced");
        }

        let (meta, table) = split_meta_block(&text)?;

        let iban = match &self.iban {
            Some(iban) => iban.clone(),
            None => find_iban(&meta)?,
        };
        let (bank_number, account_number) = split_iban(&iban)?;

        let mut rdr = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(table.as_bytes());

        let mut transactions = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let row = result?;

            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let tx = self
                .transaction_from_record(&row)
                .map_err(|e| e.in_row(idx + 1))?;
            transactions.push(tx);
        }

        // в выгрузке сначала новые операции
        transactions.reverse();
        ensure_chronological(&transactions)?;

        debug!(
            bank = self.name(),
            %bank_number,
            %account_number,
            transactions = transactions.len(),
            "read ING export"
        );

        Ok(Statement::new(bank_number, account_number, transactions))
    }
}

/// Отделяет мета-блок от таблицы операций
///
/// Возвращает непустые строки мета-блока и остаток текста.
fn split_meta_block(text: &str) -> Result<(Vec<&str>, &str), ConvertError> {
    let mut meta = Vec::with_capacity(META_BLOCK_LINES);
    let mut rest = text;

    for i in 0..META_BLOCK_LINES {
        let Some(pos) = rest.find('\n') else {
            return Err(ConvertError::Header(format!(
                "file has only {i} lines, meta block is {META_BLOCK_LINES} lines long"
            )));
        };

        let line = rest[..pos].trim_end_matches('\r');
        if !line.trim().is_empty() {
            meta.push(line);
        }
        rest = &rest[pos + 1..];
    }

    Ok((meta, rest))
}

/// Ищет строку `IBAN;<iban>` в мета-блоке
fn find_iban(meta: &[&str]) -> Result<String, ConvertError> {
    meta.iter()
        .find_map(|line| {
            let mut fields = line.split(';');
            match (fields.next(), fields.next()) {
                (Some(key), Some(value)) if key.trim() == "IBAN" => Some(value.trim().to_string()),
                _ => None,
            }
        })
        .ok_or_else(|| ConvertError::Header("IBAN line not found in meta block".into()))
}
