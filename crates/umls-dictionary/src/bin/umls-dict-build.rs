//! Build, verify and query UMLS concept dictionaries.
//!
//! Run with:
//!   umls-dict-build build --rrf-dir /data/umls/2024AA --tuis tuis.txt \
//!       --banned-ttys ttys.txt --out /data/dictionary
//!   umls-dict-build verify /data/dictionary
//!   umls-dict-build lookup /data/dictionary "chest pain"
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use umls_dictionary::{
    BuilderConfig, ConceptDictionary, DictionaryBuilder, DictionaryConfig, DictionaryManifest,
    DictionaryResult,
};

#[derive(Parser)]
#[command(name = "umls-dict-build", version, about = "UMLS concept dictionary tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a UMLS distribution into a dictionary directory
    Build(BuildArgs),
    /// Check every index file against the manifest digests
    Verify {
        /// Dictionary directory
        dir: PathBuf,
    },
    /// Print the rows stored for a phrase
    Lookup {
        /// Dictionary directory
        dir: PathBuf,
        /// Phrase to look up in the phrase and lowercase indices
        phrase: String,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// UMLS distribution root (containing META/)
    #[arg(long)]
    rrf_dir: PathBuf,
    /// Types of interest, one TUI per line
    #[arg(long)]
    tuis: PathBuf,
    /// Banned term types, one TTY per line
    #[arg(long)]
    banned_ttys: PathBuf,
    /// Banned SUIs
    #[arg(long)]
    banned_suis: Option<PathBuf>,
    /// Banned CUIs
    #[arg(long)]
    banned_cuis: Option<PathBuf>,
    /// Banned TUIs
    #[arg(long)]
    banned_tuis: Option<PathBuf>,
    /// Banned SUI-CUI pairs
    #[arg(long)]
    banned_sui_cuis: Option<PathBuf>,
    /// Minimum phrase length in characters
    #[arg(long, default_value_t = umls_dictionary::builder::DEFAULT_MIN_PHRASE_LENGTH)]
    min_phrase_length: usize,
    /// Output directory (replaced if it exists)
    #[arg(long)]
    out: PathBuf,
}

impl BuildArgs {
    fn config(&self) -> BuilderConfig {
        let mut builder = BuilderConfig::builder(&self.rrf_dir, &self.tuis, &self.banned_ttys)
            .with_min_phrase_length(self.min_phrase_length);
        if let Some(path) = &self.banned_suis {
            builder = builder.with_banned_suis(path);
        }
        if let Some(path) = &self.banned_cuis {
            builder = builder.with_banned_cuis(path);
        }
        if let Some(path) = &self.banned_tuis {
            builder = builder.with_banned_tuis(path);
        }
        if let Some(path) = &self.banned_sui_cuis {
            builder = builder.with_banned_sui_cuis(path);
        }
        builder.build()
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> DictionaryResult<()> {
    match cli.command {
        Command::Build(args) => {
            let stats = DictionaryBuilder::new(args.config()).build(&args.out)?;
            println!("{stats}");
        }
        Command::Verify { dir } => {
            let manifest = DictionaryManifest::load(&dir)?;
            manifest.verify(&dir)?;
            println!("{manifest}");
            info!(dir = %dir.display(), "all index digests match");
        }
        Command::Lookup { dir, phrase } => {
            let dictionary = ConceptDictionary::open(&dir, DictionaryConfig::default())?;
            let exact = dictionary.for_phrase(&phrase)?;
            let lower = dictionary.for_lowercase_phrase(&phrase.to_lowercase())?;
            for (label, rows) in [("phrase", exact), ("lowercase", lower)] {
                match rows {
                    None => println!("{label}: absent"),
                    Some(rows) => {
                        for row in rows {
                            let source = dictionary
                                .source(row.source())?
                                .unwrap_or_else(|| "unknown".to_string());
                            println!(
                                "{label}: {} {} {} {} {}",
                                row.cui(),
                                row.sui(),
                                row.tui(),
                                source,
                                row.code()
                            );
                        }
                    }
                }
            }
            dictionary.close()?;
        }
    }
    Ok(())
}
