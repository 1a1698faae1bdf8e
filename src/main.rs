//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use bzip2_decompressor::compression::decompress::decompress_file;
use bzip2_decompressor::session::native;
use bzip2_decompressor::tools::cli::bzopts_init;

use log::{info, LevelFilter};
use simplelog::{Config, TermLogger, TerminalMode};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> Result<(), std::io::Error> {
    // Available log levels are Error, Warn, Info, Debug, Trace. The command line narrows this.
    // Log to stderr so that -c output stays clean.
    TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let options = bzopts_init();
    native::init_ids();

    let result = decompress_file(&options);
    native::finish_all();

    info!("Done.\n");
    result
}
