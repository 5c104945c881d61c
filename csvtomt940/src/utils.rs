use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConvertError;
use crate::model::MinorUnits;

static IBAN_RE: Lazy<Regex> = Lazy::new(|| {
    // ^[A-Z]{2} - 2 буквы страны
    // \d{2} - контрольные цифры
    // [A-Z0-9]{11,30} - BBAN, у немецких IBAN это 8 цифр BLZ + 10 цифр счёта
    Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{11,30}$").unwrap()
});

/// Разбирает денежную строку в центы.
///
/// Все `,` и `.` удаляются: банки пишут и "1.000,12", и "1000,12",
/// а в обоих случаях после запятой ровно два знака.
/// Пустая строка считается нулём.
pub fn parse_minor_units(raw: &str) -> Result<MinorUnits, ConvertError> {
    if raw.is_empty() {
        return Ok(0);
    }

    let digits: String = raw.chars().filter(|c| *c != ',' && *c != '.').collect();

    digits
        .parse()
        .map_err(|e| ConvertError::InvalidAmount(format!("'{raw}': {e}")))
}

/// Заменяет немецкие умлауты двухбуквенными эквивалентами
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            'Ä' => out.push_str("AE"),
            'Ö' => out.push_str("OE"),
            'Ü' => out.push_str("UE"),
            'ß' => out.push_str("ss"),
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            other => out.push(other),
        }
    }

    out
}

/// Режет строку на куски по `width` символов, последний может быть короче.
///
/// С `trim_boundary_spaces` пробел, попавший на последнюю позицию куска,
/// выбрасывается, и на ту же позицию пробуется следующий символ.
/// Это не перенос по словам: кусок может заканчиваться посреди слова.
///
/// При `width == 0` строка возвращается одним куском.
pub fn chunk(s: &str, width: usize, trim_boundary_spaces: bool) -> Vec<String> {
    if width == 0 {
        return if s.is_empty() {
            Vec::new()
        } else {
            vec![s.to_string()]
        };
    }

    let mut parts = Vec::with_capacity(s.chars().count().div_ceil(width));
    let mut part = String::with_capacity(width);
    let mut filled = 0;

    for c in s.chars() {
        if trim_boundary_spaces && c == ' ' && filled + 1 == width {
            continue;
        }

        part.push(c);
        filled += 1;

        if filled == width {
            parts.push(std::mem::take(&mut part));
            filled = 0;
        }
    }

    if !part.is_empty() {
        parts.push(part);
    }

    parts
}

/// "D" для отрицательной суммы, иначе "C" (ноль считается кредитом)
pub fn credit_or_debit(amount: MinorUnits) -> &'static str {
    if amount < 0 { "D" } else { "C" }
}

/// Форматирует сумму по модулю для MT940: "1234,56", без разделителя тысяч
pub fn format_money(amount: MinorUnits) -> String {
    let v = amount.unsigned_abs();
    let units = v / 100;
    let frac = v % 100;

    format!("{units},{frac:02}")
}

/// Достаёт из IBAN код банка и номер счёта.
///
/// Пробелы удаляются. Код банка: символы 5..12, номер счёта: всё, что после.
pub fn split_iban(raw: &str) -> Result<(String, String), ConvertError> {
    let iban: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if !IBAN_RE.is_match(&iban) {
        return Err(ConvertError::InvalidIban(raw.trim().to_string()));
    }

    // после проверки регуляркой в строке только ASCII
    Ok((iban[4..12].to_string(), iban[12..].to_string()))
}
