use anyhow::{Context, Result};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use pgdump_decode::{DumpReader, Row, RowBatchBuilder, RowDecoder, SchemaConfig};
use std::{
    env,
    fs::{self, File},
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
    process::exit,
    time::Instant,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const BATCH_ROWS: usize = 8_192;

fn main() {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!(
            "Usage: {} <SCHEMA_FILE(.json|.yaml)> <DUMP_FILE> <OUT_PARQUET>",
            program_name(&args)
        );
        exit(2);
    }

    if let Err(e) = run(Path::new(&args[1]), Path::new(&args[2]), Path::new(&args[3])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn run(schema_path: &Path, dump_path: &Path, out_path: &Path) -> Result<()> {
    // ─── 2) schema ───────────────────────────────────────────────────
    let config = SchemaConfig::from_path(schema_path)?;
    let schema = config.build_schema()?;
    info!(columns = schema.len(), schema = %schema_path.display(), "loaded schema");

    let decoder = RowDecoder::new(schema);
    let start = Instant::now();

    // ─── 3) write to a tmp file, renamed into place on success ───────
    let tmp_path = tmp_path_for(out_path);
    let written = write_parquet(&decoder, dump_path, &tmp_path).and_then(|rows| {
        fs::rename(&tmp_path, out_path).context("renaming Parquet file into place")?;
        Ok(rows)
    });
    let total_rows = match written {
        Ok(rows) => rows,
        Err(e) => {
            if let Err(rm) = fs::remove_file(&tmp_path) {
                if rm.kind() != ErrorKind::NotFound {
                    warn!(tmp = %tmp_path.display(), error = %rm, "could not remove tmp file");
                }
            }
            return Err(e);
        }
    };

    info!(
        rows = total_rows,
        out = %out_path.display(),
        elapsed = ?start.elapsed(),
        "done"
    );
    Ok(())
}

/// Decode every record of `dump_path` into a Snappy Parquet file at `tmp_path`.
fn write_parquet(decoder: &RowDecoder, dump_path: &Path, tmp_path: &Path) -> Result<u64> {
    let mut batcher = RowBatchBuilder::new(decoder.schema(), BATCH_ROWS)?;

    let tmp_file = File::create(tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(tmp_file, decoder.arrow_schema(), Some(props))
        .context("initializing Parquet writer")?;

    // ─── 4) decode line by line ──────────────────────────────────────
    let input = File::open(dump_path).with_context(|| format!("opening {}", dump_path.display()))?;
    let mut reader = DumpReader::new(BufReader::new(input));
    let mut row = Row::new();
    let mut total_rows = 0u64;

    while let Some(line) = reader
        .next_line()
        .with_context(|| format!("reading {}", dump_path.display()))?
    {
        decoder
            .decode_into(line, &mut row)
            .with_context(|| format!("{}:{}", dump_path.display(), reader.line_no()))?;
        batcher.push(&row)?;
        total_rows += 1;

        if batcher.len() >= BATCH_ROWS {
            writer
                .write(&batcher.finish()?)
                .context("writing batch to Parquet")?;
            debug!(total_rows, "flushed batch");
        }
    }

    if !batcher.is_empty() {
        writer
            .write(&batcher.finish()?)
            .context("writing batch to Parquet")?;
    }
    writer.close().context("closing Parquet writer")?;
    Ok(total_rows)
}

/// argv[0], which the OS is free to leave out.
fn program_name(args: &[String]) -> &str {
    args.first().map_or("pgdump-decode", String::as_str)
}

fn tmp_path_for(out_path: &Path) -> PathBuf {
    let mut name = out_path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_inputs(dir: &Path, dump: &str) -> (PathBuf, PathBuf) {
        let schema = dir.join("schema.json");
        fs::write(
            &schema,
            r#"{"columns": "id,name", "columns.types": "int,string"}"#,
        )
        .unwrap();
        let dump_path = dir.join("table.dump");
        fs::write(&dump_path, dump).unwrap();
        (schema, dump_path)
    }

    #[test]
    fn writes_parquet_and_drops_tmp() {
        let dir = tempdir().unwrap();
        let (schema, dump) = write_inputs(dir.path(), "1\tone\n2\t\\N\n\\.\n");
        let out = dir.path().join("table.parquet");

        run(&schema, &dump, &out).unwrap();
        assert!(out.exists());
        assert!(!tmp_path_for(&out).exists());
    }

    #[test]
    fn failed_run_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let (schema, dump) = write_inputs(dir.path(), "1\tone\nnot-a-number\ttwo\n");
        let out = dir.path().join("table.parquet");

        let err = run(&schema, &dump, &out).unwrap_err();
        assert!(format!("{:#}", err).contains("table.dump:2"));
        assert!(!tmp_path_for(&out).exists());
        assert!(!out.exists());
    }

    #[test]
    fn program_name_survives_empty_argv() {
        assert_eq!(program_name(&[]), "pgdump-decode");
        assert_eq!(program_name(&["/usr/bin/pgd".to_string()]), "/usr/bin/pgd");
    }

    #[test]
    fn tmp_path_sits_next_to_output() {
        let out = Path::new("/data/out.parquet");
        assert_eq!(tmp_path_for(out), PathBuf::from("/data/out.parquet.tmp"));
    }
}
