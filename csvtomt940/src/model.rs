use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::error::ConvertError;

/// Денежная сумма в минимальных единицах валюты (центах), signed
pub type MinorUnits = i64;

/// Валюты, которые встречаются в выгрузках банков
///
/// Любая другая валюта хранится как есть в [`Currency::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Currency {
    /// Евро
    EUR,
    /// Американский доллар
    USD,
    /// Британский фунт
    GBP,
    /// Швейцарский франк
    CHF,

    /// Прочая валюта, ISO-код как строка
    Other(String),
}

impl Currency {
    /// Разбирает ISO-код валюты
    pub fn from_code(raw: &str) -> Self {
        let code = raw.trim().to_uppercase();

        match code.as_str() {
            "EUR" => Currency::EUR,
            "USD" => Currency::USD,
            "GBP" => Currency::GBP,
            "CHF" => Currency::CHF,
            _ => Currency::Other(code),
        }
    }

    /// 3-буквенный код для MT940
    pub fn code(&self) -> &str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
            Currency::Other(code) => code,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Сумма со знаком и валютой
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    /// сумма в центах
    pub amount: MinorUnits,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: MinorUnits, currency: Currency) -> Self {
        Money { amount, currency }
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Сумма без знака в той же валюте
    pub fn abs(&self) -> Money {
        Money::new(self.amount.abs(), self.currency.clone())
    }

    /// Складывает две суммы одной валюты
    pub fn checked_add(&self, other: &Money) -> Result<Money, ConvertError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| ConvertError::InvalidAmount(format!("overflow in {self} + {other}")))?;

        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Вычитает сумму той же валюты
    pub fn checked_sub(&self, other: &Money) -> Result<Money, ConvertError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| ConvertError::InvalidAmount(format!("overflow in {self} - {other}")))?;

        Ok(Money::new(amount, self.currency.clone()))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), ConvertError> {
        if self.currency != other.currency {
            return Err(ConvertError::CurrencyMismatch {
                left: self.currency.to_string(),
                right: other.currency.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Одна операция из выгрузки банка, уже приведённая к общему виду.
///
/// Создаётся адаптером банка и дальше не меняется.
/// `balance`: остаток на счёте после этой операции.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// дата проводки
    pub date: NaiveDate,
    /// дата валютирования
    pub value_date: NaiveDate,
    /// контрагент
    pub payee: String,
    /// текст типа операции из выгрузки
    pub transaction_type: String,
    /// ключ для поиска GVC-кода, если он отличается от `transaction_type`
    pub gvc_key: Option<String>,
    /// назначение платежа
    pub reference: String,
    /// категория, в MT940 не попадает
    pub category: String,
    pub amount: Money,
    pub balance: Money,
}

impl Transaction {
    /// Go to [`Transaction`]
    ///
    /// Дата валютирования по умолчанию совпадает с датой проводки,
    /// текстовые поля пустые.
    pub fn new(
        date: NaiveDate,
        transaction_type: impl Into<String>,
        amount: Money,
        balance: Money,
    ) -> Self {
        Transaction {
            date,
            value_date: date,
            payee: String::new(),
            transaction_type: transaction_type.into(),
            gvc_key: None,
            reference: String::new(),
            category: String::new(),
            amount,
            balance,
        }
    }

    pub fn with_value_date(mut self, value_date: NaiveDate) -> Self {
        self.value_date = value_date;
        self
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = payee.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_gvc_key(mut self, key: impl Into<String>) -> Self {
        self.gvc_key = Some(key.into());
        self
    }

    /// Ключ, по которому ищется GVC-код
    pub fn gvc_lookup_key(&self) -> &str {
        self.gvc_key.as_deref().unwrap_or(&self.transaction_type)
    }
}

/// Центральная структура библиотеки: одна выписка для записи в MT940.
///
/// Операции идут от старых к новым, все в одной валюте.
///
/// Пример использования:
/// ```no_run
/// # use csvtomt940::{BankParser, ConvertError, Ing};
/// # fn main() -> Result<(), ConvertError> {
/// let bank = Ing::new(true);
/// let file = std::fs::File::open("export.csv")?;
/// let statement = bank.parse(file)?;
///
/// let stdout = std::io::stdout();
/// statement.write_mt940(stdout.lock(), bank.gvc_table())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// код банка (BLZ)
    pub bank_number: String,
    /// номер счёта
    pub account_number: String,
    /// операции
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Go to [`Statement`]
    pub fn new(
        bank_number: impl Into<String>,
        account_number: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Statement {
            bank_number: bank_number.into(),
            account_number: account_number.into(),
            transactions,
        }
    }
}

/// Таблица "тип операции -> GVC-код" одного банка
///
/// Коды у разных банков разные, поэтому таблица передаётся в сериализацию явно.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GvcTable {
    codes: HashMap<String, String>,
}

impl GvcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transaction_type: impl Into<String>, code: impl Into<String>) {
        self.codes.insert(transaction_type.into(), code.into());
    }

    pub fn get(&self, transaction_type: &str) -> Option<&str> {
        self.codes.get(transaction_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for GvcTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        GvcTable {
            codes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Однострочное описание операции для логов
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.date,
            self.value_date,
            self.amount,
            self.balance,
            self.transaction_type,
            self.payee,
            self.reference,
        )
    }
}
