use crate::cigar::{Cigar, Kind};

/// Returns the adjusted 1-based leftmost start of a read.
///
/// Plus strand: `pos - S` when the descriptor starts with a soft clip, `pos` otherwise.
/// Minus strand: `pos + S(last) + M + D + N - 1`, the clipped 5' end of the reverse read.
pub fn adjusted_start(pos: i64, is_plus_strand: bool, cigar: &Cigar) -> i64 {
    if is_plus_strand {
        match cigar.first() {
            Some(op) if op.kind() == Kind::SoftClip => pos - i64::from(op.len()),
            _ => pos,
        }
    } else {
        let clipped = match cigar.last() {
            Some(op) if op.kind() == Kind::SoftClip => i64::from(op.len()),
            _ => 0,
        };
        let span: i64 = cigar
            .iter()
            .filter(|op| matches!(op.kind(), Kind::Match | Kind::Deletion | Kind::Skip))
            .map(|op| i64::from(op.len()))
            .sum();
        pos + clipped + span - 1
    }
}
