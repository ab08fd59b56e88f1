use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult};

use super::format::OutputBlock;
use super::{STDOUT, Statement};

/// Writes the rendered blocks to the statement's destination. Fails with
/// `NothingFound` before touching any file when the block list is empty.
pub fn assemble(blocks: &[OutputBlock], statement: &Statement) -> AppResult<()> {
    if blocks.is_empty() {
        return Err(AppError::NothingFound);
    }

    if statement.split {
        write_split(blocks, statement)
    } else {
        write_single(blocks, statement)
    }
}

/// One destination per block. Files are exclusive-create; a collision aborts
/// the run and leaves the files already written in place. To stdout the
/// blocks are concatenated with no delimiter.
fn write_split(blocks: &[OutputBlock], statement: &Statement) -> AppResult<()> {
    if statement.output == STDOUT {
        let mut stdout = io::stdout().lock();
        for block in blocks {
            stdout.write_all(block)?;
        }
        return Ok(());
    }

    let base = Path::new(&statement.output);
    for (index, block) in blocks.iter().enumerate() {
        let path = indexed_file_name(base, index);
        let mut file = create_exclusive(&path)?;
        file.write_all(block)?;
        debug!(path = %path.display(), "wrote message file");
    }

    Ok(())
}

/// All blocks into one stream with format-specific framing. The framing is
/// resolved before any I/O so an unknown format never creates a file.
fn write_single(blocks: &[OutputBlock], statement: &Statement) -> AppResult<()> {
    let frame = Framing::for_format(&statement.format)?;

    let mut writer: Box<dyn Write> = if statement.output == STDOUT {
        Box::new(io::stdout().lock())
    } else {
        Box::new(create_exclusive(Path::new(&statement.output))?)
    };

    writer.write_all(frame.open.as_bytes())?;
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            writer.write_all(frame.join.as_bytes())?;
        }
        writer.write_all(block)?;
    }
    writer.write_all(frame.close.as_bytes())?;

    Ok(())
}

struct Framing {
    open: &'static str,
    join: &'static str,
    close: &'static str,
}

impl Framing {
    fn for_format(format: &str) -> AppResult<Self> {
        match format {
            // The blocks are trusted to be independently valid JSON objects;
            // the array is assembled textually, without re-parsing them.
            "json" => Ok(Self {
                open: "[",
                join: ",",
                close: "]",
            }),
            "txt" => Ok(Self {
                open: "=== Begin Message ===\r\n",
                join: "=== End Message ===\r\n\r\n\r\n=== Begin Message ===\r\n",
                close: "=== End Message ===\r\n",
            }),
            other => Err(AppError::UnknownOutputFormat(other.to_string())),
        }
    }
}

fn create_exclusive(path: &Path) -> AppResult<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?)
}

/// Inserts a zero-based index before the extension of the base path:
/// `out.json` becomes `out_0.json`, `out_1.json`, ...
pub fn indexed_file_name(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let name = match base.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}_{index}.{ext}"),
        None => format!("{stem}_{index}"),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_before_the_extension() {
        assert_eq!(
            indexed_file_name(Path::new("out.json"), 0),
            PathBuf::from("out_0.json")
        );
        assert_eq!(
            indexed_file_name(Path::new("dir/export.txt"), 12),
            PathBuf::from("dir/export_12.txt")
        );
    }

    #[test]
    fn handles_extensionless_base() {
        assert_eq!(indexed_file_name(Path::new("out"), 3), PathBuf::from("out_3"));
    }

    #[test]
    fn empty_batch_fails_before_any_io() {
        let statement = Statement {
            output: "/nonexistent-dir/out.json".to_string(),
            split: false,
            format: "json".to_string(),
            area: "all".to_string(),
        };

        let err = assemble(&[], &statement).expect_err("empty batch should fail");
        assert!(matches!(err, AppError::NothingFound));
    }

    #[test]
    fn unknown_format_fails_before_any_io() {
        // A nonexistent parent directory would surface as an io error if a
        // file were created; the format check has to come first.
        let statement = Statement {
            output: "/nonexistent-dir/out.xml".to_string(),
            split: false,
            format: "xml".to_string(),
            area: "all".to_string(),
        };

        let err = assemble(&[b"{}".to_vec()], &statement).expect_err("unknown format should fail");
        assert!(matches!(err, AppError::UnknownOutputFormat(format) if format == "xml"));
    }
}
