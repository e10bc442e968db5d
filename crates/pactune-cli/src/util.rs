use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use pactune_weights::BaselineWeights;

/// Writes `value` as pretty JSON to `output_path`, or to standard output when unset.
pub fn save_json<T>(value: &T, output_path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let Some(path) = output_path else {
        return write_json(io::stdout().lock(), value).context("Failed to write JSON to stdout");
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_json(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))
}

fn write_json<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

/// Reads the baseline weight file at `path`, or standard input when `path` is `-`.
pub fn read_baseline<P>(path: P) -> anyhow::Result<BaselineWeights>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path == Path::new("-") {
        return BaselineWeights::read(io::stdin().lock())
            .context("Failed to read baseline weights from stdin");
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open baseline weights file: {}", path.display()))?;
    BaselineWeights::read(BufReader::new(file))
        .with_context(|| format!("Failed to parse baseline weights file: {}", path.display()))
}
