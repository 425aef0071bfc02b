mod listing;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dasm::{DisassemblerConfig, FailurePolicy, Registry};
use logger::{LogKind, init_logger};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "c28dis", version)]
#[command(about = "Table-driven disassembler for C28x-style code images", long_about = None)]
struct Args {
    /// Write logs to <tmp>/c28dis-<timestamp>.log instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble raw code images (no container parsing)
    Disasm(DisasmArgs),

    /// List the entries of an opcode table
    Opcodes {
        /// JSON opcode table
        #[arg(long)]
        table: PathBuf,
    },

    /// List the built-in C28x mnemonic catalog
    Catalog,
}

#[derive(clap::Args, Debug)]
struct DisasmArgs {
    /// JSON opcode table
    #[arg(long)]
    table: PathBuf,

    /// What to do when bytes do not decode
    #[arg(long, value_enum)]
    mode: Mode,

    /// First byte to decode in each image
    #[arg(long, value_parser = parse_number::<usize>, default_value = "0")]
    offset: usize,

    /// Number of bytes to decode (default: to the end of the image)
    #[arg(long, value_parser = parse_number::<usize>)]
    length: Option<usize>,

    /// Address of the first byte of each image
    #[arg(long, value_parser = parse_number::<u64>, default_value = "0")]
    base: u64,

    /// Raw code images, decoded in parallel
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Report undecodable bytes and resynchronize one byte later
    Scan,

    /// Stop at the first undecodable instruction and fail
    Strict,
}

impl From<Mode> for FailurePolicy {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Scan => Self::Resynchronize,
            Mode::Strict => Self::Strict,
        }
    }
}

/// Parses decimal or `0x`-prefixed hexadecimal numbers.
fn parse_number<T: TryFrom<u64>>(text: &str) -> Result<T, String> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse::<u64>(),
    }
    .map_err(|e| format!("`{text}` is not a number: {e}"))?;

    T::try_from(value).map_err(|_| format!("`{text}` is out of range"))
}

fn load_table(path: &Path) -> Result<Registry> {
    dasm::load_registry(path).with_context(|| format!("loading opcode table {}", path.display()))
}

/// Returns `false` when a strict walk stopped on an error.
fn disassemble(args: &DisasmArgs) -> Result<bool> {
    let registry = load_table(&args.table)?;
    let config = DisassemblerConfig::new(args.mode.into()).with_base_address(args.base);

    let images = args
        .inputs
        .iter()
        .map(|path| std::fs::read(path).with_context(|| format!("reading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let listings = std::thread::scope(|scope| {
        let workers: Vec<_> = images
            .iter()
            .map(|image| {
                let registry = &registry;
                scope.spawn(move || {
                    listing::render(registry, config, image, args.offset, args.length)
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().map_err(|_| anyhow!("disassembly worker panicked")))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut out = BufWriter::new(io::stdout().lock());
    let mut clean = true;

    for (path, rendered) in args.inputs.iter().zip(&listings) {
        tracing::info!(
            "{}: {} instruction(s), {} error(s)",
            path.display(),
            rendered.instructions,
            rendered.errors
        );

        if args.inputs.len() > 1 {
            writeln!(out, "; {}", path.display())?;
        }
        for line in &rendered.lines {
            writeln!(out, "{line}")?;
        }

        if args.mode == Mode::Strict && rendered.errors > 0 {
            clean = false;
        }
    }
    out.flush()?;

    Ok(clean)
}

fn list_opcodes(table: &Path) -> Result<()> {
    let registry = load_table(table)?;
    let mut out = BufWriter::new(io::stdout().lock());

    for entry in registry.all() {
        writeln!(out, "{}", listing::entry_line(entry))?;
    }
    out.flush()?;

    Ok(())
}

fn list_catalog() -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());

    writeln!(out, "; catalog version {}", dasm::opcode::CATALOG_VERSION)?;
    for (id, mnemonic) in dasm::opcode::C28X_MNEMONICS {
        writeln!(out, "{id:>5}  {mnemonic}")?;
    }
    out.flush()?;

    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    match &args.command {
        Command::Disasm(disasm) => disassemble(disasm),
        Command::Opcodes { table } => list_opcodes(table).map(|()| true),
        Command::Catalog => list_catalog().map(|()| true),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let kind = if args.log_file {
        LogKind::FILE
    } else {
        LogKind::STDERR
    };
    let _logger = match init_logger(kind) {
        Ok(guard) => {
            if let Some(path) = guard.path() {
                eprintln!("Logging to file: {}", path.display());
            }
            guard
        }
        Err(e) => {
            eprintln!("cannot set up logging: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers() {
        assert_eq!(parse_number::<usize>("16"), Ok(16));
        assert_eq!(parse_number::<u64>("0x3F_8000"), Ok(0x3F_8000));
        assert_eq!(parse_number::<u64>("0XFF"), Ok(0xFF));
        assert!(parse_number::<u8>("0x100").is_err());
        assert!(parse_number::<usize>("twelve").is_err());
    }

    #[test]
    fn cli_requires_explicit_mode() {
        assert!(Args::try_parse_from(["c28dis", "disasm", "--table", "t.json", "a.bin"]).is_err());

        let args = Args::try_parse_from([
            "c28dis", "disasm", "--table", "t.json", "--mode", "strict", "--base", "0x8000",
            "a.bin", "b.bin",
        ])
        .unwrap();
        match args.command {
            Command::Disasm(disasm) => {
                assert_eq!(disasm.mode, Mode::Strict);
                assert_eq!(disasm.base, 0x8000);
                assert_eq!(disasm.inputs.len(), 2);
                assert_eq!(FailurePolicy::from(disasm.mode), FailurePolicy::Strict);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
