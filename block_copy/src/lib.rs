//! # Block Copy
//!
//! Copies a byte stream in fixed-size blocks, optionally stopping after a
//! number of blocks, and reports how much was copied.

use std::fs::File;
use std::io::{self, Read, Write};
use tracing::debug;

/// Path that stands for stdin (as input) or stdout (as output).
pub const STDIO_PATH: &str = "-";

pub const DEFAULT_BLOCK_SIZE: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Block size must be positive")]
    InvalidBlockSize,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CopyError {
    fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CopyError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => CopyError::PermissionDenied(path.to_string()),
            io::ErrorKind::Interrupted => CopyError::Interrupted,
            _ => CopyError::Io(err),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub blocks: u64,
    pub bytes: u64,
}

/// Copies `reader` to `writer` in blocks of `block_size` bytes.
///
/// A block is filled until it is full or the input ends, so only the last
/// block may be short. Stops at end of input or after `count` blocks.
pub fn copy_blocks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    block_size: usize,
    count: Option<u64>,
) -> Result<CopyStats, CopyError> {
    if block_size == 0 {
        return Err(CopyError::InvalidBlockSize);
    }

    let mut buffer = vec![0u8; block_size];
    let mut stats = CopyStats::default();

    while count.map_or(true, |limit| stats.blocks < limit) {
        let filled = fill_block(reader, &mut buffer)?;
        if filled == 0 {
            break;
        }

        writer
            .write_all(&buffer[..filled])
            .map_err(|e| CopyError::from_io(e, "output"))?;
        stats.blocks += 1;
        stats.bytes += filled as u64;
    }

    writer.flush().map_err(|e| CopyError::from_io(e, "output"))?;
    debug!("Copied {} blocks ({} bytes)", stats.blocks, stats.bytes);
    Ok(stats)
}

/// Opens `input` and `output` (either may be [`STDIO_PATH`]) and copies.
/// The input is opened first, so a missing source never creates the output.
pub fn copy_path(
    input: &str,
    output: &str,
    block_size: usize,
    count: Option<u64>,
) -> Result<CopyStats, CopyError> {
    if block_size == 0 {
        return Err(CopyError::InvalidBlockSize);
    }

    let mut reader: Box<dyn Read> = if input == STDIO_PATH {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(input).map_err(|e| CopyError::from_io(e, input))?)
    };

    let mut writer: Box<dyn Write> = if output == STDIO_PATH {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(output).map_err(|e| CopyError::from_io(e, output))?)
    };

    copy_blocks(&mut reader, &mut writer, block_size, count)
}

fn fill_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, CopyError> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => return Err(CopyError::from_io(e, "input")),
        }
    }
    Ok(filled)
}
