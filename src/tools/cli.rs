use clap::Parser;
use log::{info, LevelFilter};
use std::{fmt::Display, fmt::Formatter};

use crate::tools::options::{InputFormat, SessionOptions};

/// Compressed bytes handed to the session per read.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Unzip or Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Define the two output channels
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    name = "bzip2-decompressor",
    version,
    about = "Streaming bzip2 decompressor",
    long_about = "
    Decompresses a bzip2 file through the session interface, feeding the compressed data in
    pieces the way a native caller would. Both plain bzip2 streams and size-framed chunks
    are accepted."
)]
pub struct Args {
    /// Compressed file to read
    #[clap()]
    filename: String,

    /// Keep input file
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Force overwriting output file
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Send output to the terminal
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test")]
    test: bool,

    /// Input is a sequence of size-framed chunks
    #[clap(long = "framed")]
    framed: bool,

    /// Skip block and stream CRC checks
    #[clap(long = "no-crc")]
    no_crc: bool,

    /// Compressed bytes supplied per read
    #[clap(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Sets verbosity. -v shows warnings, -vvvv is chatty
    #[clap(short = 'v', long = "verbose", parse(from_occurrences))]
    verbose: u64,
}

/// Define all user settable options to control program behavior
#[derive(Debug, Clone)]
pub struct BzOpts {
    /// Name of the file to read for input
    pub file: String,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Compressed bytes supplied to the session per read
    pub chunk_size: usize,
    /// Settings for the decompression session
    pub session: SessionOptions,
    /// Log level requested on the command line
    pub verbose: LevelFilter,
}

impl From<Args> for BzOpts {
    fn from(args: Args) -> Self {
        let format = if args.framed {
            InputFormat::Framed
        } else {
            InputFormat::Raw
        };
        Self {
            file: args.filename,
            force_overwrite: args.force,
            keep_input_files: args.keep,
            op_mode: if args.test { Mode::Test } else { Mode::Unzip },
            output: if args.stdout {
                Output::Stdout
            } else {
                Output::File
            },
            chunk_size: args.chunk_size.max(1),
            session: SessionOptions::new()
                .with_format(format)
                .with_crc_check(!args.no_crc),
            verbose: verbosity(args.verbose),
        }
    }
}

fn verbosity(count: u64) -> LevelFilter {
    match count {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse options from an explicit argument list.
pub fn bzopts_from<I, T>(args: I) -> Result<BzOpts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(Args::try_parse_from(args)?.into())
}

/// Parse the process arguments, exiting with usage information on error.
pub fn bzopts_init() -> BzOpts {
    let opts: BzOpts = Args::parse().into();
    log::set_max_level(opts.verbose);

    // Below we report initialization status to the user
    info!("---- Initialization Start ----");
    info!("Verbosity set to {}", opts.verbose);
    info!("Operational mode set to {}", opts.op_mode);
    info!("Getting input from the file {}", opts.file);
    info!("Input format set to {}", opts.session.format);
    info!("Sending output to {}", opts.output);
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    if opts.keep_input_files {
        info!("Keeping input files")
    };
    info!("---- Initialization End ----\n");
    opts
}
