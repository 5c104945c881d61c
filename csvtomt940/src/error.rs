use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error;

/// Ошибки при чтении банковских выгрузок и записи MT940
#[derive(Debug, Error)]
pub enum ConvertError {
    // обёртки

    /// обёртка csv::Error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// обёртка chrono::ParseError
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
    /// обёртка std::io::Error
    #[error("io error: {0}")]
    Io(#[from] IoError),
    /// файл не удалось открыть или записать
    #[error("could not access file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    // логические ошибки

    /// строку не удалось разобрать как денежную сумму
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// для типа операции нет GVC-кода в таблице банка
    #[error("could not find gvc code for transaction type: {0}")]
    UnknownTransactionType(String),
    /// назначение платежа не помещается в поля ?20..?27
    #[error("reference is too long: {fields} fields of 27 chars, at most 8 allowed")]
    ReferenceTooLong { fields: usize },
    /// содержимое :86: длиннее 390 символов
    #[error("multipurpose line is too long: {len} chars, at most 390 allowed")]
    MultipurposeLineTooLong { len: usize },
    /// пустой номер банка или счёта
    #[error("could not create account line with empty {0}")]
    MissingIdentifier(&'static str),
    /// в выписке нет ни одной операции
    #[error("no transactions found, could not create {0} line")]
    EmptyStatement(&'static str),
    /// суммы в разных валютах
    #[error("currency mismatch: {left} and {right}")]
    CurrencyMismatch { left: String, right: String },
    /// ошибка конкретной операции выписки, индекс с единицы
    #[error("could not convert transaction {index}: {source}")]
    Transaction {
        index: usize,
        #[source]
        source: Box<ConvertError>,
    },
    /// ошибка конкретной строки выгрузки, индекс с единицы
    #[error("could not read row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<ConvertError>,
    },
    /// ошибка разбора мета-блока выгрузки
    #[error("invalid header: {0}")]
    Header(String),
    /// очень общая ошибка плохих входных данных
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("invalid iban: {0}")]
    InvalidIban(String),
    /// операции идут не по возрастанию даты
    #[error("transactions are not in chronological order at transaction {index}")]
    UnorderedTransactions { index: usize },
}

impl ConvertError {
    /// Оборачивает ошибку индексом операции (с единицы)
    pub(crate) fn in_transaction(self, index: usize) -> Self {
        ConvertError::Transaction {
            index,
            source: Box::new(self),
        }
    }

    /// Оборачивает ошибку номером строки выгрузки (с единицы)
    pub(crate) fn in_row(self, row: usize) -> Self {
        ConvertError::Row {
            row,
            source: Box::new(self),
        }
    }
}
