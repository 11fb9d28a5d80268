use ahash::{AHashMap, AHashSet};

/// Positions seen per strand of a single chromosome.
#[derive(Debug, Default)]
struct StrandNode {
    plus: AHashSet<i64>,
    minus: AHashSet<i64>,
}

impl StrandNode {
    fn positions_mut(&mut self, is_plus_strand: bool) -> &mut AHashSet<i64> {
        if is_plus_strand {
            &mut self.plus
        } else {
            &mut self.minus
        }
    }
}

/// Key of a single-end read for duplicate detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DupKey<'a> {
    pub umi: &'a [u8],
    pub chrom: &'a [u8],
    pub is_plus_strand: bool,
    pub start: i64,
}

/// Prefix tree of every `(umi, chromosome, strand, start)` observed so far.
///
/// The UMI and chromosome names are stored once per distinct prefix, so reads sharing a UMI and
/// chromosome only add a position to a set. Entries are never removed.
#[derive(Debug, Default)]
pub struct DupIndex {
    umis: AHashMap<Vec<u8>, AHashMap<Vec<u8>, StrandNode>>,
    keys: usize,
}

impl DupIndex {
    pub fn new() -> DupIndex {
        DupIndex::default()
    }

    /// Records `key`.
    ///
    /// Returns: `true` the first time this exact key is observed, `false` for a duplicate
    pub fn observe(&mut self, key: DupKey<'_>) -> bool {
        // lookup by borrowed slice first, the owned copies are only made for new prefixes
        let chroms = match self.umis.get_mut(key.umi) {
            Some(chroms) => chroms,
            None => self.umis.entry(key.umi.to_vec()).or_default(),
        };
        let strands = match chroms.get_mut(key.chrom) {
            Some(strands) => strands,
            None => chroms.entry(key.chrom.to_vec()).or_default(),
        };

        let first = strands.positions_mut(key.is_plus_strand).insert(key.start);
        if first {
            self.keys += 1;
        }
        first
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key<'a>(umi: &'a str, chrom: &'a str, is_plus_strand: bool, start: i64) -> DupKey<'a> {
        DupKey { umi: umi.as_bytes(), chrom: chrom.as_bytes(), is_plus_strand, start }
    }

    #[test]
    fn first_seen_then_duplicate() {
        let mut index = DupIndex::new();
        assert!(index.observe(key("AACGCCAT", "1", true, 100)));
        assert!(!index.observe(key("AACGCCAT", "1", true, 100)));
        assert!(!index.observe(key("AACGCCAT", "1", true, 100)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn every_component_separates() {
        let mut index = DupIndex::new();
        assert!(index.observe(key("AACGCCAT", "1", true, 100)));
        assert!(index.observe(key("AAGGTACG", "1", true, 100)));
        assert!(index.observe(key("AACGCCAT", "2", true, 100)));
        assert!(index.observe(key("AACGCCAT", "1", false, 100)));
        assert!(index.observe(key("AACGCCAT", "1", true, 101)));
        assert_eq!(index.len(), 5);

        assert!(!index.observe(key("AACGCCAT", "1", false, 100)));
        assert!(!index.observe(key("AACGCCAT", "2", true, 100)));
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn shares_prefixes() {
        let mut index = DupIndex::new();
        for start in 0..100 {
            assert!(index.observe(key("AACGCCAT", "1", start % 2 == 0, start)));
        }
        assert_eq!(index.umis.len(), 1);
        assert_eq!(index.umis[&b"AACGCCAT"[..]].len(), 1);
        assert_eq!(index.len(), 100);
    }
}
