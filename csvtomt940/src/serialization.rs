mod mt940_helpers;
mod multipurpose;

use std::io::Write;
use tracing::debug;

use crate::error::ConvertError;
use crate::model::{GvcTable, Statement};

const HEADER_LINE: &str = ":20:CSVTOMT940\r\n";
const STATEMENT_LINE: &str = ":28C:0\r\n";

impl Statement {
    /// Записывает выписку в формате MT940
    ///
    /// GVC-коды берутся из `gvc_table` банка, из которого пришла выписка.
    /// Первая же ошибка прерывает запись; то, что уже ушло во `writer`, не откатывается.
    /// Ошибки операций оборачиваются в [`ConvertError::Transaction`] с номером операции с единицы.
    pub fn write_mt940<W: Write>(
        &self,
        mut writer: W,
        gvc_table: &GvcTable,
    ) -> Result<(), ConvertError> {
        debug!(
            bank_number = %self.bank_number,
            account_number = %self.account_number,
            transactions = self.transactions.len(),
            "writing mt940 statement"
        );

        // ---- ШАПКА ----

        writer.write_all(HEADER_LINE.as_bytes())?;

        let account_line =
            mt940_helpers::format_account_line(&self.bank_number, &self.account_number)?;
        writer.write_all(account_line.as_bytes())?;

        writer.write_all(STATEMENT_LINE.as_bytes())?;

        let opening_line = mt940_helpers::format_opening_balance_line(&self.transactions)?;
        writer.write_all(opening_line.as_bytes())?;

        // ---- ОПЕРАЦИИ ----

        for (idx, tx) in self.transactions.iter().enumerate() {
            debug!(index = idx + 1, %tx, "writing transaction");

            let sales_line = mt940_helpers::format_61_line(tx);
            let info_line = multipurpose::format_86_line(tx, gvc_table)
                .map_err(|e| e.in_transaction(idx + 1))?;

            writer.write_all(sales_line.as_bytes())?;
            writer.write_all(info_line.as_bytes())?;
        }

        // ---- Footer ----

        let closing_line = mt940_helpers::format_closing_balance_line(&self.transactions)?;
        writer.write_all(closing_line.as_bytes())?;
        writer.write_all(b"\r\n")?;

        writer.flush()?;
        Ok(())
    }

    /// Собирает всю выписку в памяти: при ошибке не остаётся полузаписанного файла
    pub fn to_mt940_bytes(&self, gvc_table: &GvcTable) -> Result<Vec<u8>, ConvertError> {
        let mut buf = Vec::new();
        self.write_mt940(&mut buf, gvc_table)?;
        Ok(buf)
    }
}
