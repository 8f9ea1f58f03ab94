use crate::prelude::*;
use crate::search::common::{adjust_score_for_ply, adjust_score_from_ply};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is the exact evaluation [alpha < score < beta]
    Exact,
    /// Score is at least this value, i.e, beta cutoff [score >= beta]
    Lower,
    /// Score is at most this value, i.e, alpha not improved [score <= alpha]
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranspositionEntry {
    pub key: u64,
    /// Remaining depth the score was searched to
    pub depth: u8,
    /// Mate scores are stored relative to this node, not the root
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

#[derive(Debug)]
pub struct TranspositionTable {
    entries: Vec<Option<TranspositionEntry>>,
    mask: usize,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TranspositionTable {
    /// Table of at most `size_mb` megabytes, rounded down to a power of two entries.
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TranspositionEntry>>();
        let num_entries = (size_mb.max(1) * 1024 * 1024) / entry_size;
        let size = if num_entries.is_power_of_two() {
            num_entries
        } else {
            num_entries.next_power_of_two() >> 1
        };
        debug!("Allocating transposition table with {size} entries");
        Self {
            entries: vec![None; size],
            mask: size - 1,
        }
    }

    #[inline(always)]
    fn index(&self, key: u64) -> usize {
        key as usize & self.mask
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry stored for `key`, with its score converted to be relative to `ply`.
    ///
    /// The flag says whether the score alone settles the node: the entry is
    /// deep enough and either exact, or its bound closes the window
    /// `(alpha, beta)`. The entry is returned even when unusable so its move
    /// can seed ordering.
    pub fn lookup(
        &self,
        key: u64,
        alpha: i32,
        beta: i32,
        depth: u8,
        ply: usize,
    ) -> (Option<TranspositionEntry>, bool) {
        let Some(mut entry) = self.entries[self.index(key)].filter(|e| e.key == key) else {
            return (None, false);
        };
        entry.score = adjust_score_for_ply(entry.score, ply);

        if entry.depth < depth {
            return (Some(entry), false);
        }

        let mut alpha = alpha;
        let mut beta = beta;
        match entry.bound {
            Bound::Exact => return (Some(entry), true),
            Bound::Lower => alpha = alpha.max(entry.score),
            Bound::Upper => beta = beta.min(entry.score),
        }
        (Some(entry), alpha >= beta)
    }

    /// Stores a search result, classifying it against the window it was searched with.
    /// Always overwrites whatever shared the slot.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        key: u64,
        score: i32,
        best_move: Option<Move>,
        depth: u8,
        alpha: i32,
        beta: i32,
        ply: usize,
    ) {
        let bound = if score <= alpha {
            Bound::Upper
        } else if score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        let index = self.index(key);
        self.entries[index] = Some(TranspositionEntry {
            key,
            depth,
            score: adjust_score_from_ply(score, ply),
            bound,
            best_move,
        });
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    /// Per-mille occupancy, sampled from the first thousand slots
    pub fn hash_full(&self) -> u16 {
        let sample = self.entries.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        (used * 1000 / sample) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: u64 = 0xDEAD_BEEF_1234_5678;

    fn mv() -> Move {
        Move::new(
            "e2".parse().unwrap(),
            "e4".parse().unwrap(),
            Piece::Pawn,
            MoveKind::DoublePush,
            None,
        )
    }

    #[test]
    fn size_is_power_of_two() {
        let tt = TranspositionTable::new(1);
        assert!(tt.len().is_power_of_two());
        assert!(tt.len() * std::mem::size_of::<Option<TranspositionEntry>>() <= 1024 * 1024);
    }

    #[test]
    fn exact_entry_is_usable() {
        let mut tt = TranspositionTable::new(1);
        tt.insert(KEY, 30, Some(mv()), 4, 0, 100, 0);
        let (entry, usable) = tt.lookup(KEY, -50, 50, 4, 0);
        let entry = entry.unwrap();
        assert!(usable);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.score, 30);
        assert_eq!(entry.best_move, Some(mv()));
    }

    #[test]
    fn shallow_entry_only_gives_move() {
        let mut tt = TranspositionTable::new(1);
        tt.insert(KEY, 30, Some(mv()), 2, 0, 100, 0);
        let (entry, usable) = tt.lookup(KEY, -50, 50, 3, 0);
        assert!(!usable);
        assert_eq!(entry.unwrap().best_move, Some(mv()));
    }

    #[test]
    fn bounds_tighten_the_window() {
        let mut tt = TranspositionTable::new(1);
        // fail high at beta = 100
        tt.insert(KEY, 120, None, 5, 0, 100, 0);
        assert_eq!(tt.lookup(KEY, 0, 100, 5, 0).0.unwrap().bound, Bound::Lower);
        assert!(tt.lookup(KEY, 0, 100, 5, 0).1);
        assert!(tt.lookup(KEY, 0, 110, 5, 0).1);
        assert!(!tt.lookup(KEY, 0, 200, 5, 0).1);

        // fail low at alpha = 0
        tt.insert(KEY, -20, None, 5, 0, 100, 0);
        assert_eq!(tt.lookup(KEY, 0, 100, 5, 0).0.unwrap().bound, Bound::Upper);
        assert!(tt.lookup(KEY, -10, 100, 5, 0).1);
        assert!(!tt.lookup(KEY, -50, 100, 5, 0).1);
    }

    #[test]
    fn collisions_overwrite_and_keys_are_checked() {
        let mut tt = TranspositionTable::new(1);
        let other = KEY.wrapping_add(tt.len() as u64);
        tt.insert(KEY, 10, None, 3, -100, 100, 0);
        tt.insert(other, 20, None, 1, -100, 100, 0);
        assert!(tt.lookup(KEY, -100, 100, 0, 0).0.is_none());
        assert_eq!(tt.lookup(other, -100, 100, 0, 0).0.unwrap().score, 20);
    }

    #[test]
    fn mate_scores_are_stored_relative_to_node() {
        let mut tt = TranspositionTable::new(1);
        // mate found 2 plies below a node at ply 3
        tt.insert(KEY, MATE_SCORE - 5, None, 4, -INFINITY, INFINITY, 3);
        let (entry, _) = tt.lookup(KEY, -INFINITY, INFINITY, 0, 1);
        assert_eq!(entry.unwrap().score, MATE_SCORE - 3);
    }

    #[test]
    fn clear_and_hash_full() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.hash_full(), 0);
        for key in 0..500u64 {
            tt.insert(key, 0, None, 1, -1, 1, 0);
        }
        assert_eq!(tt.hash_full(), 500);
        tt.clear();
        assert_eq!(tt.hash_full(), 0);
        assert!(tt.lookup(3, -1, 1, 0, 0).0.is_none());
    }
}
