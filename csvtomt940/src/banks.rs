pub mod ing;
pub mod n26;

use csv::StringRecord;
use std::io::{Read, Write};
use tracing::debug;

use crate::error::ConvertError;
use crate::model::{GvcTable, Statement, Transaction};

/// Длиннее банки всё равно не выгружают, а в ?32/?33 помещается 54 символа
const MAX_PAYEE_LEN: usize = 54;

/// Адаптер выгрузки конкретного банка.
///
/// Каждый банк знает формат своего CSV и свою таблицу GVC-кодов.
/// Возвращаемая выписка уже упорядочена от старых операций к новым,
/// а `balance` каждой операции образует непрерывную цепочку.
pub trait BankParser {
    /// короткое имя банка для логов
    fn name(&self) -> &'static str;

    /// таблица "тип операции -> GVC-код"
    fn gvc_table(&self) -> &GvcTable;

    /// Читает выгрузку целиком и строит выписку
    fn parse<R: Read>(&self, reader: R) -> Result<Statement, ConvertError>;

    /// Читает выгрузку и пишет её в MT940, возвращает число операций
    fn convert<R: Read, W: Write>(&self, reader: R, writer: W) -> Result<usize, ConvertError> {
        let statement = self.parse(reader)?;
        debug!(
            bank = self.name(),
            transactions = statement.transactions.len(),
            "parsed bank export"
        );

        statement.write_mt940(writer, self.gvc_table())?;
        Ok(statement.transactions.len())
    }
}

/// Значение колонки строки выгрузки без пробелов по краям
pub(crate) fn field(row: &StringRecord, idx: usize) -> Result<&str, ConvertError> {
    row.get(idx)
        .map(str::trim)
        .ok_or_else(|| ConvertError::BadInput(format!("row has no column {idx}: {row:?}")))
}

/// Обрезает имя контрагента до 54 символов
pub(crate) fn truncate_payee(payee: &str) -> String {
    payee.chars().take(MAX_PAYEE_LEN).collect()
}

/// Проверяет, что даты проводки не убывают
///
/// Начальный и конечный остатки считаются по первой и последней операции,
/// так что порядок обязателен.
pub(crate) fn ensure_chronological(transactions: &[Transaction]) -> Result<(), ConvertError> {
    for (idx, pair) in transactions.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            return Err(ConvertError::UnorderedTransactions { index: idx + 2 });
        }
    }
    Ok(())
}
