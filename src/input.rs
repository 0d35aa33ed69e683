use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

/// Name accepted for standard input.
pub const STDIN: &str = "-";

/// Opens `path` (or stdin for `-`) and transparently peels off GZIP/BGZF layers.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == STDIN {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
        Box::new(BufReader::new(file))
    };
    decompress(reader).with_context(|| format!("failed to read input {}", path.display()))
}

/// Wraps `reader` in a gzip decoder for every gzip layer found at its head.
pub fn decompress(mut reader: Box<dyn BufRead>) -> io::Result<Box<dyn BufRead>> {
    const MAX_DEPTH: usize = 4;

    for _ in 0..MAX_DEPTH {
        if !is_gzip(reader.fill_buf()?) {
            break;
        }
        tracing::debug!("Detected GZIP/BGZF layer");
        // MultiGzDecoder also handles BGZF blocks and concatenated members.
        reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
    }
    Ok(reader)
}

fn is_gzip(head: &[u8]) -> bool {
    head.len() >= 2 && head[0] == 0x1f && head[1] == 0x8b
}
