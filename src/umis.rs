use std::path::Path;

use ahash::AHashSet;
use tokio::fs;

use crate::record::trim_eol;

/// The set of expected UMI sequences.
#[derive(Debug, Default)]
pub struct UmiSet(AHashSet<Vec<u8>>);

impl UmiSet {
    /// Read a newline separated UMI list. Blank lines are ignored.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<UmiSet> {
        let data = fs::read(path).await?;
        Ok(UmiSet::from_bytes(&data))
    }

    pub fn from_bytes(data: &[u8]) -> UmiSet {
        data.split_inclusive(|&b| b == b'\n')
            .map(trim_eol)
            .filter(|umi| !umi.is_empty())
            .collect()
    }

    pub fn contains(&self, umi: &[u8]) -> bool {
        self.0.contains(umi)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a [u8]> for UmiSet {
    fn from_iter<I: IntoIterator<Item = &'a [u8]>>(iter: I) -> Self {
        UmiSet(iter.into_iter().map(|umi| umi.to_vec()).collect())
    }
}
