use log::{error, info, trace, warn};

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use crate::compression::stream::MAX_BLOCK_SIZE;
use crate::error::BzError;
use crate::session::{native, SessionHandle};
use crate::tools::cli::{BzOpts, Mode, Output};

/// Size of the output buffer handed to each decompress call.
const OUTPUT_BUFFER_SIZE: usize = 256 * 1024;

/// Name of the file we write: the input name with `.bz2` stripped, or `.out` appended.
pub fn output_name(input: &str) -> PathBuf {
    match input.strip_suffix(".bz2") {
        Some(stem) if !stem.is_empty() => PathBuf::from(stem),
        _ => PathBuf::from(format!("{}.out", input)),
    }
}

/// Decompress (or test) the file named in opts by streaming it through a session.
pub fn decompress_file(opts: &BzOpts) -> io::Result<()> {
    let mut f_in = File::open(&opts.file)?;

    // Prepare the output before starting a session.
    let target = output_name(&opts.file);
    let mut f_out: Box<dyn Write> = match (opts.op_mode, opts.output) {
        (Mode::Test, _) => Box::new(io::sink()),
        (Mode::Unzip, Output::Stdout) => Box::new(BufWriter::new(io::stdout())),
        (Mode::Unzip, Output::File) => {
            if target.exists() && !opts.force_overwrite {
                error!("Output file {} already exists.", target.display());
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", target.display()),
                ));
            }
            Box::new(BufWriter::new(
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&target)?,
            ))
        }
    };

    let hint = opts.chunk_size.min(MAX_BLOCK_SIZE);
    let handle = native::init_with_options(hint, opts.session.clone())?;
    let result = pump(handle, &mut f_in, &mut f_out, opts.chunk_size);
    // Always release the session, whatever happened.
    if let Err(e) = native::finish(handle) {
        warn!("Could not finish {}: {}", handle, e);
    }
    let result = result.and_then(|total| {
        f_out.flush()?;
        Ok(total)
    });
    drop(f_out);

    match result {
        Ok(total) => {
            match opts.op_mode {
                Mode::Test => info!("{}: ok ({} bytes).", opts.file, total),
                Mode::Unzip => info!("{}: done ({} bytes).", opts.file, total),
            }
            if opts.op_mode == Mode::Unzip
                && opts.output == Output::File
                && !opts.keep_input_files
            {
                fs::remove_file(&opts.file)?;
            }
            Ok(())
        }
        Err(e) => {
            error!("{}: {}", opts.file, e);
            if opts.op_mode == Mode::Unzip && opts.output == Output::File {
                remove_partial(&target);
            }
            Err(e)
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove partial output {}: {}", path.display(), e);
    }
}

/// Feed the input to the session in `chunk_size` pieces and write everything it produces.
/// Returns the total number of decompressed bytes.
fn pump(
    handle: SessionHandle,
    f_in: &mut impl Read,
    f_out: &mut impl Write,
    chunk_size: usize,
) -> io::Result<u64> {
    let mut chunk = vec![0_u8; chunk_size];
    let mut out = vec![0_u8; OUTPUT_BUFFER_SIZE];
    let mut eof = false;

    loop {
        if !eof {
            let n = f_in.read(&mut chunk)?;
            if n == 0 {
                eof = true;
            } else {
                native::supply_input(handle, &chunk[..n])?;
                trace!("\rSupplied {} compressed bytes.", n);
            }
        }

        // Drain everything the buffered input can produce.
        loop {
            match native::decompress_bytes_direct(handle, &mut out) {
                Ok(0) => break,
                Ok(n) => f_out.write_all(&out[..n])?,
                Err(e) if e.is_truncated() && !eof => break,
                Err(e) => return Err(e.into()),
            }
        }

        if eof {
            if native::is_stream_end(handle)? {
                break;
            }
            let err = BzError::TruncatedInput {
                needed: 1,
                available: 0,
            };
            return Err(err.into());
        }
    }

    let consumed = native::get_amount_of_consumed_input(handle)?;
    let total = native::get_amount_of_consumed_output(handle)?;
    info!(
        "Consumed {} compressed bytes, produced {} bytes.",
        consumed, total
    );
    Ok(total)
}
