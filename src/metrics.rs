use std::fmt;

use ahash::AHashMap;

pub const DUPS_REMOVED: &str = "dups_removed";
pub const INVALID_UMIS: &str = "invalid_umis";
pub const MALFORMED: &str = "malformed";

/// Deduplication counts.
#[derive(Debug, Default)]
pub struct Metrics {
    headers: usize,
    kept_per_chrom: AHashMap<Vec<u8>, usize>,
    kept: usize,
    duplicates_removed: usize,
    invalid_umis: usize,
    malformed: usize,
}

pub enum Status<'a> {
    Header,
    Kept(&'a [u8]),
    Duplicate,
    InvalidUmi,
    Malformed,
}

impl fmt::Display for Metrics {
    /// Tab separated `category count` table, sorted by category.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows: Vec<(String, usize)> = self
            .kept_per_chrom
            .iter()
            .map(|(chrom, &n)| (String::from_utf8_lossy(chrom).into_owned(), n))
            .collect();
        rows.push((DUPS_REMOVED.to_owned(), self.duplicates_removed));
        rows.push((INVALID_UMIS.to_owned(), self.invalid_umis));
        if self.malformed > 0 {
            rows.push((MALFORMED.to_owned(), self.malformed));
        }
        rows.sort();

        for (category, n) in rows {
            writeln!(f, "{}\t{}", category, n)?;
        }
        Ok(())
    }
}

impl Metrics {
    pub fn count(&mut self, status: Status<'_>) {
        match status {
            Status::Header => self.headers += 1,
            Status::Kept(chrom) => {
                self.kept += 1;
                match self.kept_per_chrom.get_mut(chrom) {
                    Some(n) => *n += 1,
                    None => {
                        self.kept_per_chrom.insert(chrom.to_vec(), 1);
                    }
                }
            }
            Status::Duplicate => self.duplicates_removed += 1,
            Status::InvalidUmi => self.invalid_umis += 1,
            Status::Malformed => self.malformed += 1,
        }
    }

    pub fn headers(&self) -> usize {
        self.headers
    }

    pub fn kept(&self) -> usize {
        self.kept
    }

    pub fn kept_on(&self, chrom: &[u8]) -> usize {
        self.kept_per_chrom.get(chrom).copied().unwrap_or(0)
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    pub fn invalid_umis(&self) -> usize {
        self.invalid_umis
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Number of data lines seen.
    pub fn records(&self) -> usize {
        self.kept + self.duplicates_removed + self.invalid_umis + self.malformed
    }
}
