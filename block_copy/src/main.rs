use block_copy::{copy_path, CopyError, DEFAULT_BLOCK_SIZE, STDIO_PATH};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "block_copy")]
#[command(about = "Copy a file or stream in fixed-size blocks")]
struct Cli {
    /// Input file ("-" for stdin)
    #[arg(long = "if", default_value = STDIO_PATH)]
    input: String,

    /// Output file ("-" for stdout)
    #[arg(long = "of", default_value = STDIO_PATH)]
    output: String,

    /// Block size in bytes
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE as i64, allow_hyphen_values = true)]
    bs: i64,

    /// Copy at most this many blocks
    #[arg(long, allow_hyphen_values = true)]
    count: Option<i64>,
}

fn main() -> ExitCode {
    let _guard = init_tracing();
    let cli = Cli::parse();

    if cli.bs <= 0 {
        error!("Block size must be positive, got {}", cli.bs);
        return ExitCode::from(1);
    }
    let count = match cli.count {
        Some(n) if n < 0 => {
            error!("Count must be non-negative, got {}", n);
            return ExitCode::from(1);
        }
        other => other.map(|n| n as u64),
    };

    info!("Copying {} -> {} (bs={})", cli.input, cli.output, cli.bs);
    match copy_path(&cli.input, &cli.output, cli.bs as usize, count) {
        Ok(stats) => {
            eprintln!("{} blocks ({} bytes) copied", stats.blocks, stats.bytes);
            ExitCode::SUCCESS
        }
        Err(CopyError::Interrupted) => {
            error!("Copy interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .finish();

    tracing::subscriber::set_default(subscriber)
}
