//! Command-line interface for the `llgen` table generator.
//!
//! Reads a `.llg` grammar, converts it to LL(1) and writes the report with
//! productions, FIRST/FOLLOW sets and the analyze table.

#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Convert an llkit grammar to LL(1) and write its analyze table")]
    struct Args {
        /// Path to the input grammar file.
        #[arg(short = 'g', long)]
        grammar: PathBuf,

        /// Path to the output report.
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Enable debug logging (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        let args = Args::parse();
        let level = if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
        llkit_gen::generate(args.grammar, args.output)
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("llgen disabled (compiled without `cli` feature)");
}
