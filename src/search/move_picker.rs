use crate::{
    prelude::*,
    search::move_ordering::{MoveScoringPolicy, OrderingContext},
};

/// MovePicker: Picks moves one at a time without re-scoring.
///
/// Scores all moves once upfront, then uses O(n) selection to find the best
/// remaining move on each call to `next_best()`. This is faster than full sorting
/// when beta cutoffs happen early (which is common with good move ordering).
///
/// The picker does not keep the ordering context, so the caller is free to
/// recurse with `&mut self` while picking.
pub struct MovePicker<'a> {
    moves: &'a mut [Move],
    scores: [i32; MAX_MOVES],
    current: usize,
}

impl<'a> MovePicker<'a> {
    pub fn new<P: MoveScoringPolicy>(ctx: &OrderingContext, moves: &'a mut [Move]) -> Self {
        debug_assert!(moves.len() <= MAX_MOVES, "Too many moves");

        let mut scores = [0i32; MAX_MOVES];
        for (i, &mv) in moves.iter().enumerate() {
            scores[i] = P::score(ctx, mv);
        }

        Self {
            moves,
            scores,
            current: 0,
        }
    }

    /// Returns the next best move, or None if all moves have been picked.
    #[inline]
    pub fn next_best(&mut self) -> Option<Move> {
        if self.current >= self.moves.len() {
            return None;
        }

        let mut best_idx = self.current;
        let mut best_score = self.scores[self.current];

        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_score = self.scores[i];
                best_idx = i;
            }
        }

        self.moves.swap(self.current, best_idx);
        self.scores.swap(self.current, best_idx);

        let result = self.moves[self.current];
        self.current += 1;
        Some(result)
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.moves.len().saturating_sub(self.current)
    }
}

impl Iterator for MovePicker<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_best()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MovePicker<'_> {
    fn len(&self) -> usize {
        self.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::move_ordering::{MainSearchPolicy, OrderingWeights, QSearchPolicy};

    fn with_ctx<R>(
        fen: &str,
        hint: Option<&str>,
        f: impl FnOnce(&OrderingContext, &mut MoveBuffer) -> R,
    ) -> R {
        let (board, side) = parse_position(fen).unwrap();
        let (mut moves, pins) = legal_moves(&board, side);
        let weights = OrderingWeights::default();
        let params = EvalParams::default();
        let hint = hint.map(|h| parse_user_move(&board, side, h).unwrap());
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers: [None; 2],
            hint,
        };
        f(&ctx, &mut moves)
    }

    #[test]
    fn picks_every_move_once() {
        with_ctx(KIWIPETE, None, |ctx, moves| {
            let total = moves.len();
            let picker = MovePicker::new::<MainSearchPolicy>(ctx, moves.as_mut_slice());
            assert_eq!(picker.len(), total);
            let picked: Vec<Move> = picker.collect();
            assert_eq!(picked.len(), total);
            let unique: std::collections::HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), total, "Duplicate move picked!");
        });
    }

    #[test]
    fn picks_in_descending_score_order() {
        with_ctx(KIWIPETE, None, |ctx, moves| {
            let mut picker = MovePicker::new::<MainSearchPolicy>(ctx, moves.as_mut_slice());
            let mut last = i32::MAX;
            while let Some(mv) = picker.next_best() {
                let score = MainSearchPolicy::score(ctx, mv);
                assert!(score <= last);
                last = score;
            }
            assert_eq!(picker.remaining(), 0);
        });
    }

    #[test]
    fn hint_is_picked_first() {
        with_ctx(START_FEN, Some("b1c3"), |ctx, moves| {
            let mut picker = MovePicker::new::<MainSearchPolicy>(ctx, moves.as_mut_slice());
            assert_eq!(picker.next_best().unwrap().uci(), "b1c3");
            assert_eq!(picker.remaining(), 19);
        });
    }

    #[test]
    fn qsearch_policy_prefers_captures() {
        with_ctx(KIWIPETE, None, |ctx, moves| {
            let mut picker = MovePicker::new::<QSearchPolicy>(ctx, moves.as_mut_slice());
            assert!(picker.next_best().unwrap().is_capture());
        });
    }
}
