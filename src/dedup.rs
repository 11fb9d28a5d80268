use std::convert::TryFrom;

use clap::ValueEnum;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    app::UmiDedupError,
    dups::{DupIndex, DupKey},
    io::LineIo,
    metrics::{Metrics, Status},
    record::{is_header, umi_from_read_name, RecordError, UmiRecord},
    umis::UmiSet,
};

/// What to do with data lines that cannot be parsed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum MalformedPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Drop the line and count it
    Skip,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Header,
    Unique,
    Duplicate,
    InvalidUmi,
}

impl Decision {
    /// Headers and first occurrences are written, everything else is dropped.
    pub fn is_kept(&self) -> bool {
        matches!(self, Decision::Header | Decision::Unique)
    }
}

/// Single pass deduplication state: the valid UMIs, every key seen so far and the counts.
#[derive(Debug)]
pub struct Deduper {
    umis: UmiSet,
    seen: DupIndex,
    metrics: Metrics,
    malformed: MalformedPolicy,
}

impl Deduper {
    pub fn new(umis: UmiSet, malformed: MalformedPolicy) -> Deduper {
        Deduper {
            umis,
            seen: DupIndex::new(),
            metrics: Metrics::default(),
            malformed,
        }
    }

    /// Classify a single input line and update the counts.
    ///
    /// The UMI is checked before the remaining fields are parsed, a line with an unknown UMI
    /// is dropped without looking at its alignment.
    pub fn check_line(&mut self, line: &[u8]) -> Result<Decision, RecordError> {
        if is_header(line) {
            self.metrics.count(Status::Header);
            return Ok(Decision::Header);
        }

        let read_name = line.split(|&b| b == b'\t').next().unwrap_or(line);
        if !self.umis.contains(umi_from_read_name(read_name)) {
            self.metrics.count(Status::InvalidUmi);
            return Ok(Decision::InvalidUmi);
        }

        let record = UmiRecord::try_from(line)?;
        let key = DupKey {
            umi: record.umi(),
            chrom: record.chrom(),
            is_plus_strand: record.is_plus_strand(),
            start: record.dedup_start(),
        };

        if self.seen.observe(key) {
            self.metrics.count(Status::Kept(record.chrom()));
            Ok(Decision::Unique)
        } else {
            self.metrics.count(Status::Duplicate);
            Ok(Decision::Duplicate)
        }
    }

    /// Stream every line from `io` input to `io` output, dropping duplicates and reads with
    /// an invalid UMI. The output is shut down when the pass ends, also when it fails, so every
    /// line forwarded before an error is kept.
    pub async fn run<R, W>(&mut self, io: &mut LineIo<R, W>) -> Result<(), UmiDedupError>
    where
        R: AsyncRead + std::marker::Unpin,
        W: AsyncWrite + std::marker::Unpin,
    {
        let result = self.stream(io).await;
        let closed = io.shutdown().await;
        result?;
        closed?;
        debug!("{} distinct keys seen", self.seen.len());

        Ok(())
    }

    async fn stream<R, W>(&mut self, io: &mut LineIo<R, W>) -> Result<(), UmiDedupError>
    where
        R: AsyncRead + std::marker::Unpin,
        W: AsyncWrite + std::marker::Unpin,
    {
        let mut line = Vec::new();
        while io.read_line(&mut line).await? {
            match self.check_line(&line) {
                Ok(decision) => {
                    if decision.is_kept() {
                        io.write_line(&line).await?;
                    }
                }
                Err(e) => match self.malformed {
                    MalformedPolicy::Fail => {
                        return Err(UmiDedupError::Malformed { line: io.line_number(), source: e })
                    }
                    MalformedPolicy::Skip => {
                        warn!("skipping malformed line {}: {}", io.line_number(), e);
                        self.metrics.count(Status::Malformed);
                    }
                },
            }
        }
        Ok(())
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> Metrics {
        self.metrics
    }
}

/// Deduplicate `input` into `output` in a single pass.
pub async fn process<R, W>(
    input: R,
    output: W,
    umis: UmiSet,
    malformed: MalformedPolicy,
) -> Result<Metrics, UmiDedupError>
where
    R: AsyncRead + std::marker::Unpin,
    W: AsyncWrite + std::marker::Unpin,
{
    let mut io = LineIo::new(input, output);
    let mut deduper = Deduper::new(umis, malformed);
    deduper.run(&mut io).await?;
    Ok(deduper.into_metrics())
}

#[cfg(test)]
mod test {
    use super::*;

    const UMIS: &[u8] = b"AACGCCAT\nAAGGTACG\nAATTCCGG\n";

    const SAM: &str = "@HD\tVN:1.0\tSO:unsorted
@SQ\tSN:1\tLN:248956422
r1:AACGCCAT\t0\t1\t100\t36\t100M\t*\t0\t0\tA\tE
r2:AACGCCAT\t0\t1\t105\t36\t5S95M\t*\t0\t0\tA\tE
r3:AACGCCAT\t0\t1\t101\t36\t100M\t*\t0\t0\tA\tE
r4:AAGGTACG\t0\t1\t100\t36\t100M\t*\t0\t0\tA\tE
r5:GGGGGGGG\t0\t1\t100\t36\t100M\t*\t0\t0\tA\tE
r6:AACGCCAT\t16\t1\t100\t36\t90M5S\t*\t0\t0\tA\tE
r7:AACGCCAT\t16\t1\t105\t36\t90M\t*\t0\t0\tA\tE
@CO\tinterleaved comment
r8:AACGCCAT\t0\t2\t100\t36\t100M\t*\t0\t0\tA\tE
r9:AATTCCGG\t0\t1\t100\t36\t100M\t*\t0\t0\tA\tE
";

    async fn dedup(
        input: &[u8],
        malformed: MalformedPolicy,
    ) -> Result<(Vec<u8>, Metrics), UmiDedupError> {
        let mut out = Vec::new();
        let metrics = process(input, &mut out, UmiSet::from_bytes(UMIS), malformed).await?;
        Ok((out, metrics))
    }

    fn read_names(out: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(out)
            .lines()
            .filter(|l| !l.starts_with('@'))
            .map(|l| l.split(':').next().unwrap().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn removes_duplicates() {
        let (out, metrics) = dedup(SAM.as_bytes(), MalformedPolicy::Fail).await.unwrap();
        // r2 starts at 100 after clipping, r7 ends where r6 does
        assert_eq!(read_names(&out), vec!["r1", "r3", "r4", "r6", "r8", "r9"]);
        assert_eq!(metrics.duplicates_removed(), 2);
        assert_eq!(metrics.invalid_umis(), 1);
        assert_eq!(metrics.kept_on(b"1"), 5);
        assert_eq!(metrics.kept_on(b"2"), 1);
        assert_eq!(metrics.headers(), 3);
    }

    #[tokio::test]
    async fn output_lines_unchanged() {
        let (out, _) = dedup(SAM.as_bytes(), MalformedPolicy::Fail).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        let input: Vec<&str> = SAM.lines().collect();
        let mut last = 0;
        for line in out.lines() {
            let pos = input.iter().position(|l| *l == line).unwrap();
            assert!(pos >= last);
            last = pos;
        }
        let headers: Vec<&str> = out.lines().filter(|l| l.starts_with('@')).collect();
        assert_eq!(
            headers,
            vec!["@HD\tVN:1.0\tSO:unsorted", "@SQ\tSN:1\tLN:248956422", "@CO\tinterleaved comment"]
        );
    }

    #[tokio::test]
    async fn idempotent() {
        let (once, _) = dedup(SAM.as_bytes(), MalformedPolicy::Fail).await.unwrap();
        let (twice, metrics) = dedup(&once, MalformedPolicy::Fail).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(metrics.duplicates_removed(), 0);
        assert_eq!(metrics.invalid_umis(), 0);
    }

    #[tokio::test]
    async fn first_occurrence_wins() {
        let sam = "b:AACGCCAT\t0\t1\t100\t36\t100M\t*\t0\t0\tAC\tEE\r
a:AACGCCAT\t0\t1\t100\t36\t100M\t*\t0\t0\tAC\tEE\r
";
        let (out, _) = dedup(sam.as_bytes(), MalformedPolicy::Fail).await.unwrap();
        assert_eq!(out, b"b:AACGCCAT\t0\t1\t100\t36\t100M\t*\t0\t0\tAC\tEE\r\n");
    }

    #[tokio::test]
    async fn invalid_umi_is_not_parsed() {
        let sam = "r1:GGGGGGGG\tbad\n";
        let (out, metrics) = dedup(sam.as_bytes(), MalformedPolicy::Fail).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(metrics.invalid_umis(), 1);
    }

    #[tokio::test]
    async fn malformed_fails() {
        let sam = "@HD\tVN:1.0\nr1:AACGCCAT\t0\t1\t100\t36\t10M5S10M\n";
        match dedup(sam.as_bytes(), MalformedPolicy::Fail).await {
            Err(UmiDedupError::Malformed { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, RecordError::Cigar(..)));
            }
            other => panic!("expected malformed error, got {:?}", other.map(|(o, _)| o)),
        }
    }

    #[tokio::test]
    async fn malformed_keeps_forwarded_lines() {
        let sam = "@HD\tVN:1.0\nr1:AACGCCAT\t0\t1\t100\t36\t10M\nr2:AACGCCAT\t0\t1\tx\t36\t10M\n";
        let mut out = Vec::new();
        let result = process(
            sam.as_bytes(),
            &mut out,
            UmiSet::from_bytes(UMIS),
            MalformedPolicy::Fail,
        )
        .await;
        assert!(matches!(result, Err(UmiDedupError::Malformed { line: 3, .. })));
        assert_eq!(out, b"@HD\tVN:1.0\nr1:AACGCCAT\t0\t1\t100\t36\t10M\n");
    }

    #[tokio::test]
    async fn malformed_skipped() {
        let sam = "r1:AACGCCAT\t0\t1\tx\t36\t10M\nr2:AACGCCAT\t0\t1\t100\t36\t10M";
        let (out, metrics) = dedup(sam.as_bytes(), MalformedPolicy::Skip).await.unwrap();
        assert_eq!(out, b"r2:AACGCCAT\t0\t1\t100\t36\t10M");
        assert_eq!(metrics.malformed(), 1);
        assert_eq!(metrics.records(), 2);
    }
}
