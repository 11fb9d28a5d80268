use std::marker::Unpin;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use log::{debug, info};
use thiserror::Error;
use tokio::{
    fs::File,
    io::{self, AsyncRead, AsyncWrite},
};

use crate::{
    dedup::{Deduper, MalformedPolicy},
    io::LineIo,
    metrics::Metrics,
    record::RecordError,
    umis::UmiSet,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    /// The input single-end SAM file, use `-` to read from stdin.
    /// The file does not need to be sorted
    #[clap(short = 'f', long)]
    pub input: PathBuf,

    /// The output SAM file with PCR duplicates removed, use `-` to write to stdout
    #[clap(short, long)]
    pub output: PathBuf,

    /// File with the expected UMIs, one per line.
    /// Reads with a UMI not in this list are removed
    #[clap(short, long)]
    pub umis: PathBuf,

    /// How to handle data lines that cannot be parsed. `fail` aborts the run,
    /// `skip` drops and counts the line. Unmapped reads with `*` as CIGAR count as
    /// unparsable, use `skip` for aligner output that still contains them
    #[clap(long, value_enum, default_value_t = MalformedPolicy::Fail)]
    pub malformed: MalformedPolicy,

    /// Increase logging verbosity, repeat for more
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[clap(short, long)]
    pub quiet: bool,
}

const STDIO: &str = "-";

fn is_stdio(p: &Path) -> bool {
    p.as_os_str() == STDIO
}

pub struct App {
    config: Config,
    io: LineIo<Box<dyn AsyncRead + Unpin>, Box<dyn AsyncWrite + Unpin>>,
    deduper: Deduper,
}

impl App {
    /// Load the UMI list and open the input and output. Nothing is read from the input yet.
    pub async fn new(config: Config) -> Result<App, UmiDedupError> {
        let umis = UmiSet::from_path(&config.umis)
            .await
            .map_err(|source| UmiDedupError::UmiList { path: config.umis.clone(), source })?;
        debug!("loaded {} UMIs from {}", umis.len(), config.umis.display());

        let read: Box<dyn AsyncRead + Unpin> = if is_stdio(&config.input) {
            Box::new(io::stdin())
        } else {
            let file = File::open(&config.input)
                .await
                .map_err(|source| UmiDedupError::Input { path: config.input.clone(), source })?;
            Box::new(file)
        };

        let write: Box<dyn AsyncWrite + Unpin> = if is_stdio(&config.output) {
            Box::new(io::stdout())
        } else {
            let file = File::create(&config.output)
                .await
                .map_err(|source| UmiDedupError::Output { path: config.output.clone(), source })?;
            Box::new(file)
        };

        let deduper = Deduper::new(umis, config.malformed);
        Ok(App { config, io: LineIo::new(read, write), deduper })
    }

    /// Deduplicate the input in a single pass and log the counts.
    pub async fn run(&mut self) -> Result<(), UmiDedupError> {
        info!(
            "removing duplicates from {} into {}",
            self.config.input.display(),
            self.config.output.display()
        );

        self.deduper.run(&mut self.io).await?;

        let m = self.metrics();
        info!(
            "{} records read: {} kept, {} duplicates removed, {} invalid UMIs, {} malformed",
            m.records(),
            m.kept(),
            m.duplicates_removed(),
            m.invalid_umis(),
            m.malformed()
        );
        debug!("counts per category:\n{}", m);

        Ok(())
    }

    pub fn metrics(&self) -> &Metrics {
        self.deduper.metrics()
    }
}

#[derive(Debug, Error)]
pub enum UmiDedupError {
    #[error("could not read UMI list {}", .path.display())]
    UmiList { path: PathBuf, source: std::io::Error },
    #[error("could not open input {}", .path.display())]
    Input { path: PathBuf, source: std::io::Error },
    #[error("could not create output {}", .path.display())]
    Output { path: PathBuf, source: std::io::Error },
    #[error("IoError")]
    IoError(#[from] std::io::Error),
    #[error("malformed record on line {line}")]
    Malformed { line: usize, source: RecordError },
}
