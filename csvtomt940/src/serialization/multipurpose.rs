use crate::error::ConvertError;
use crate::model::{GvcTable, Transaction};
use crate::utils::{chunk, transliterate};

/// ширина одного подполя ?NN
const FIELD_WIDTH: usize = 27;
/// подполя ?20..?27 под назначение платежа
const MAX_REFERENCE_FIELDS: usize = 8;
const MAX_CONTENT_LEN: usize = 390;
/// физическая длина строки MT940
const LINE_WIDTH: usize = 65;

const REFERENCE_CONTROL_START: u32 = 20;
const PAYEE_CONTROL_START: u32 = 32;

/// Формирует запись :86: для операции
///
/// `:86:<GVC>?00<тип>?20..?27<SVWZ+назначение>?NNKREF+NONREF?32..<контрагент>`
///
/// Вся запись собирается в строку, так что при ошибке ничего не пишется.
pub(super) fn format_86_line(
    tx: &Transaction,
    gvc_table: &GvcTable,
) -> Result<String, ConvertError> {
    let key = tx.gvc_lookup_key();
    let gvc_code = gvc_table
        .get(key)
        .ok_or_else(|| ConvertError::UnknownTransactionType(key.to_string()))?;

    let (reference, next_control) = reference_fields(&tx.reference)?;
    let payee = payee_fields(&tx.payee);

    let content = format!(
        "{gvc_code}?00{}{reference}?{next_control:02}KREF+NONREF{payee}",
        transliterate(&tx.transaction_type),
    );

    let len = content.chars().count();
    if len > MAX_CONTENT_LEN {
        return Err(ConvertError::MultipurposeLineTooLong { len });
    }

    let lines = chunk(&content, LINE_WIDTH, false);

    Ok(format!(":86:{}\r\n", lines.join("\r\n")))
}

/// Подполя ?20.. с назначением платежа и номер следующего свободного поля
fn reference_fields(reference: &str) -> Result<(String, u32), ConvertError> {
    if reference.is_empty() {
        return Ok((String::new(), REFERENCE_CONTROL_START));
    }

    let parts = chunk(&format!("SVWZ+{reference}"), FIELD_WIDTH, true);
    if parts.len() > MAX_REFERENCE_FIELDS {
        return Err(ConvertError::ReferenceTooLong { fields: parts.len() });
    }

    Ok(join_with_control(&parts, REFERENCE_CONTROL_START))
}

/// Подполя ?32.. с именем контрагента
fn payee_fields(payee: &str) -> String {
    if payee.is_empty() {
        return String::new();
    }

    let (fields, _) = join_with_control(&chunk(payee, FIELD_WIDTH, true), PAYEE_CONTROL_START);
    fields
}

/// Ставит перед каждым куском управляющий код ?NN, начиная с `start`
fn join_with_control(parts: &[String], start: u32) -> (String, u32) {
    let mut out = String::new();
    let mut control = start;

    for part in parts {
        out.push_str(&format!("?{control:02}{}", part.trim()));
        control += 1;
    }

    (out, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Money};
    use chrono::NaiveDate;

    fn table() -> GvcTable {
        [
            ("Lastschrift", "005"),
            ("Überweisung", "020"),
            ("Abschluss", "805"),
        ]
        .into_iter()
        .collect()
    }

    fn tx(transaction_type: &str, reference: &str, payee: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2000, 1, 2).unwrap();
        Transaction::new(
            date,
            transaction_type,
            Money::new(0, Currency::EUR),
            Money::new(0, Currency::EUR),
        )
        .with_reference(reference)
        .with_payee(payee)
    }

    #[test]
    fn empty_reference_and_payee() {
        let line = format_86_line(&tx("Lastschrift", "", ""), &table()).unwrap();
        assert_eq!(line, ":86:005?00Lastschrift?20KREF+NONREF\r\n");
    }

    #[test]
    fn reference_without_payee() {
        let line = format_86_line(&tx("Lastschrift", "test", ""), &table()).unwrap();
        assert_eq!(line, ":86:005?00Lastschrift?20SVWZ+test?21KREF+NONREF\r\n");
    }

    #[test]
    fn reference_with_payee() {
        let line = format_86_line(&tx("Lastschrift", "test", "testname"), &table()).unwrap();
        assert_eq!(
            line,
            ":86:005?00Lastschrift?20SVWZ+test?21KREF+NONREF?32testname\r\n"
        );
    }

    #[test]
    fn transaction_type_umlauts_are_replaced() {
        let line = format_86_line(&tx("Überweisung", "test", "testname"), &table()).unwrap();
        assert_eq!(
            line,
            ":86:020?00UEberweisung?20SVWZ+test?21KREF+NONREF?32testname\r\n"
        );
    }

    #[test]
    fn unknown_transaction_type_fails() {
        let err = format_86_line(&tx("Abschuss", "test", "testname"), &table()).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownTransactionType(ref t) if t == "Abschuss"));
    }

    #[test]
    fn gvc_key_is_used_for_lookup_but_not_printed() {
        let t = tx("Zahlung", "", "").with_gvc_key("Lastschrift");
        let line = format_86_line(&t, &table()).unwrap();
        assert_eq!(line, ":86:005?00Zahlung?20KREF+NONREF\r\n");
    }

    #[test]
    fn reference_longer_than_eight_fields_fails() {
        let reference = "a".repeat(8 * 27);
        let err = format_86_line(&tx("Lastschrift", &reference, "testname"), &table()).unwrap_err();
        assert!(matches!(err, ConvertError::ReferenceTooLong { fields: 9 }));
    }

    #[test]
    fn content_longer_than_390_chars_fails() {
        let reference = "a".repeat(7 * 27);
        let payee = "testname".repeat(20);
        let err = format_86_line(&tx("Lastschrift", &reference, &payee), &table()).unwrap_err();
        assert!(matches!(err, ConvertError::MultipurposeLineTooLong { len } if len > 390));
    }

    #[test]
    fn long_content_is_split_into_65_char_lines() {
        let reference = "a".repeat(7 * 27);
        let line = format_86_line(&tx("Lastschrift", &reference, "testname"), &table()).unwrap();

        let expected = [
            "005?00Lastschrift?20SVWZ+aaaaaaaaaaaaaaaaaaaaaa?21aaaaaaaaaaaaaaa",
            "aaaaaaaaaaaa?22aaaaaaaaaaaaaaaaaaaaaaaaaaa?23aaaaaaaaaaaaaaaaaaaa",
            "aaaaaaa?24aaaaaaaaaaaaaaaaaaaaaaaaaaa?25aaaaaaaaaaaaaaaaaaaaaaaaa",
            "aa?26aaaaaaaaaaaaaaaaaaaaaaaaaaa?27aaaaa?28KREF+NONREF?32testname",
        ];
        assert_eq!(line, format!(":86:{}\r\n", expected.join("\r\n")));
    }

    #[test]
    fn long_payee_uses_two_fields() {
        let reference = "a".repeat(27);
        let payee = "b".repeat(53);
        let line = format_86_line(&tx("Lastschrift", &reference, &payee), &table()).unwrap();

        let expected = [
            "005?00Lastschrift?20SVWZ+aaaaaaaaaaaaaaaaaaaaaa?21aaaaa?22KREF+NO",
            "NREF?32bbbbbbbbbbbbbbbbbbbbbbbbbbb?33bbbbbbbbbbbbbbbbbbbbbbbbbb",
        ];
        assert_eq!(line, format!(":86:{}\r\n", expected.join("\r\n")));
    }

    #[test]
    fn control_codes_skip_boundary_spaces() {
        // пробел на 27-й позиции выбрасывается, а не переносится в ?21
        let reference = "NR7778648141 INTERNET KAUFUMSATZ";
        let line = format_86_line(&tx("Lastschrift", reference, ""), &table()).unwrap();
        assert_eq!(
            line,
            ":86:005?00Lastschrift?20SVWZ+NR7778648141 INTERNETK?21AUFUMSATZ?22KRE\r\nF+NONREF\r\n"
        );
    }

    #[test]
    fn join_with_control_numbers_trimmed_parts() {
        let parts = vec![" SVWZ+abc ".to_string(), "def".to_string(), "  ".to_string()];
        let (fields, next) = join_with_control(&parts, REFERENCE_CONTROL_START);

        assert_eq!(fields, "?20SVWZ+abc?21def?22");
        assert_eq!(next, 23);

        assert_eq!(join_with_control(&[], PAYEE_CONTROL_START), (String::new(), 32));
    }
}
