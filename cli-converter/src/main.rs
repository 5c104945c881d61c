use clap::{Parser, Subcommand};
use csvtomt940::{BankParser, ConvertError, Ing, MinorUnits, N26};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "csvtomt940",
    version,
    about = "Конвертирует CSV-выгрузки банков в выписки MT940 (.sta).",
    long_about = None,
)]
struct Args {
    #[command(subcommand)]
    bank: Bank,

    /// Выходной файл (по умолчанию входной с расширением .sta)
    #[arg(long, global = true)]
    output: Option<PathBuf>,
}

/// Поддерживаемые банки
#[derive(Subcommand, Debug)]
enum Bank {
    /// Выгрузка ING (ISO-8859-1, разделитель ';')
    Ing {
        /// Старый формат выгрузки, без колонки категории
        #[arg(long)]
        old_syntax: bool,

        /// IBAN вместо указанного в шапке выгрузки
        #[arg(long)]
        iban: Option<String>,

        /// Входной CSV-файл
        input: PathBuf,
    },
    /// Выгрузка N26 (UTF-8, разделитель ',')
    N26 {
        /// IBAN счёта, в выгрузке его нет
        #[arg(long)]
        iban: String,

        /// Остаток до первой операции, в центах
        #[arg(long, allow_hyphen_values = true)]
        start_balance: MinorUnits,

        /// Выгрузка без колонки категории
        #[arg(long)]
        no_category: bool,

        /// Входной CSV-файл
        input: PathBuf,
    },
}

impl Bank {
    fn input(&self) -> &Path {
        match self {
            Bank::Ing { input, .. } | Bank::N26 { input, .. } => input,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        error!("{err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ConvertError> {
    let args = Args::parse();
    debug!(?args, "parsed arguments");

    let input = args.bank.input();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sta_path(input));

    let count = match &args.bank {
        Bank::Ing { old_syntax, iban, .. } => {
            let mut bank = Ing::new(!old_syntax);
            if let Some(iban) = iban {
                bank = bank.with_iban(iban.clone());
            }
            convert_file(&bank, input, &output)?
        }
        Bank::N26 {
            iban,
            start_balance,
            no_category,
            ..
        } => {
            let bank = N26::new(iban.clone(), *start_balance, !no_category);
            convert_file(&bank, input, &output)?
        }
    };

    info!(output = %output.display(), transactions = count, "done");
    Ok(())
}

/// Конвертирует файл выгрузки, возвращает число операций
///
/// Выписка целиком собирается в памяти, выходной файл пишется только при успехе.
fn convert_file<B: BankParser>(
    bank: &B,
    input: &Path,
    output: &Path,
) -> Result<usize, ConvertError> {
    let file = File::open(input).map_err(|source| ConvertError::File {
        path: input.to_path_buf(),
        source,
    })?;

    let mut buf: Vec<u8> = Vec::new();
    let count = bank.convert(BufReader::new(file), &mut buf)?;

    fs::write(output, &buf).map_err(|source| ConvertError::File {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(count)
}

/// Путь выходного файла: расширение входного заменяется на .sta
fn sta_path(input: &Path) -> PathBuf {
    input.with_extension("sta")
}
