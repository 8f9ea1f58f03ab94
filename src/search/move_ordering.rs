use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Killer moves remembered per ply
pub const KILLER_SLOTS: usize = 2;

/// Move heuristic weights, the `[ordering]` config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingWeights {
    /// TT move or previous iteration's best move
    pub hint_bonus: i32,
    /// Pawn, Knight, Bishop, Rook, Queen, King as victim/attacker.
    /// The king is worth nothing as an attacker: it can only take undefended pieces.
    pub piece_values: [i32; NUM_PIECES],
    pub capture_bonus: i32,
    pub mvv_lva_multiplier: i32,
    /// Extra for captures whose victim is worth at least the attacker
    pub good_trade_bonus: i32,
    pub killer_bonus: i32,
    pub check_bonus: i32,
    /// Added to the promoted piece's value
    pub promotion_bonus: i32,
    pub pst_delta_scale: i32,
    pub pawn_attacked_penalty: i32,
    pub attacked_penalty: i32,
}

impl Default for OrderingWeights {
    fn default() -> Self {
        Self {
            hint_bonus: 2_000_000,
            piece_values: [100, 320, 330, 500, 900, 0],
            capture_bonus: 100_000,
            mvv_lva_multiplier: 10,
            good_trade_bonus: 50_000,
            killer_bonus: 40_000,
            check_bonus: 20_000,
            promotion_bonus: 200_000,
            pst_delta_scale: 1,
            pawn_attacked_penalty: 300,
            attacked_penalty: 100,
        }
    }
}

impl OrderingWeights {
    #[inline(always)]
    const fn value(&self, piece: Piece) -> i32 {
        self.piece_values[piece.index()]
    }
}

/// Ring of quiet moves that caused a beta cutoff, per ply.
#[derive(Debug, Clone)]
pub struct KillerTable {
    slots: [[Option<Move>; KILLER_SLOTS]; MAX_PLY],
    next: [usize; MAX_PLY],
}

impl Default for KillerTable {
    fn default() -> Self {
        Self {
            slots: [[None; KILLER_SLOTS]; MAX_PLY],
            next: [0; MAX_PLY],
        }
    }
}

impl KillerTable {
    #[inline]
    pub fn get(&self, ply: usize) -> [Option<Move>; KILLER_SLOTS] {
        self.slots.get(ply).copied().unwrap_or([None; KILLER_SLOTS])
    }

    /// Stores `mv` in the oldest slot of `ply`, unless it is already there.
    pub fn insert(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY || self.slots[ply].contains(&Some(mv)) {
            return;
        }
        let slot = self.next[ply];
        self.slots[ply][slot] = Some(mv);
        self.next[ply] = (slot + 1) % KILLER_SLOTS;
    }

    pub fn clear(&mut self) {
        self.slots = [[None; KILLER_SLOTS]; MAX_PLY];
        self.next = [0; MAX_PLY];
    }
}

/// Everything a policy needs to score the moves of one node.
pub struct OrderingContext<'a> {
    pub board: &'a Board,
    pub side: Side,
    pub pins: &'a PinData,
    pub weights: &'a OrderingWeights,
    pub params: &'a EvalParams,
    pub killers: [Option<Move>; KILLER_SLOTS],
    pub hint: Option<Move>,
}

pub trait MoveScoringPolicy {
    fn score(ctx: &OrderingContext, mv: Move) -> i32;
}

/// Full heuristic used by the main search
pub struct MainSearchPolicy;

/// Captures and promotions only, for quiescence
pub struct QSearchPolicy;

impl MoveScoringPolicy for MainSearchPolicy {
    fn score(ctx: &OrderingContext, mv: Move) -> i32 {
        let w = ctx.weights;
        if ctx.hint == Some(mv) {
            return w.hint_bonus;
        }

        let mut score = capture_score(w, mv) + promotion_score(w, mv);

        if mv.is_quiet() && ctx.killers.contains(&Some(mv)) {
            score += w.killer_bonus;
        }
        if gives_direct_check(ctx, mv) {
            score += w.check_bonus;
        }

        let from = ctx.params.pst(mv.piece, ctx.side, mv.from);
        let to = ctx.params.pst(mv.piece, ctx.side, mv.to);
        score += (to.sum() - from.sum()) * w.pst_delta_scale;

        if mv.piece != Piece::King {
            if ctx.pins.pawn_attacks.contains(mv.to) {
                score -= w.pawn_attacked_penalty;
            } else if ctx.pins.attacked.contains(mv.to) {
                score -= w.attacked_penalty;
            }
        }
        score
    }
}

impl MoveScoringPolicy for QSearchPolicy {
    fn score(ctx: &OrderingContext, mv: Move) -> i32 {
        capture_score(ctx.weights, mv) + promotion_score(ctx.weights, mv)
    }
}

#[inline]
fn capture_score(w: &OrderingWeights, mv: Move) -> i32 {
    let Some(victim) = mv.captured else {
        return 0;
    };
    // Most Valuable Victim - Least Valuable Attacker
    let trade = w.value(victim) - w.value(mv.piece);
    let mut score = w.capture_bonus + trade * w.mvv_lva_multiplier;
    if trade >= 0 {
        score += w.good_trade_bonus;
    }
    score
}

#[inline]
fn promotion_score(w: &OrderingWeights, mv: Move) -> i32 {
    mv.promotion()
        .map_or(0, |piece| w.promotion_bonus + w.value(piece))
}

/// Whether the moved piece attacks the enemy king from its destination.
/// Discovered checks are not detected.
fn gives_direct_check(ctx: &OrderingContext, mv: Move) -> bool {
    let enemy_king = ctx.board.king_square(ctx.side.flip());
    let piece = mv.promotion().unwrap_or(mv.piece);
    let tables = &*ATTACK_TABLES;
    let attacks = match piece {
        Piece::King => return false,
        Piece::Pawn => tables.pawn_attacks(mv.to, ctx.side),
        Piece::Knight => tables.knight(mv.to),
        _ => {
            let occupied = (ctx.board.occupied() & !BitBoard::from_square(mv.from))
                | BitBoard::from_square(mv.to);
            tables.piece_attacks(piece, mv.to, occupied)
        }
    };
    attacks.contains(enemy_king)
}

/// Sorts `moves` best first under policy `P`.
pub fn sort_moves<P: MoveScoringPolicy>(ctx: &OrderingContext, moves: &mut [Move]) {
    moves.sort_by_cached_key(|&mv| std::cmp::Reverse(P::score(ctx, mv)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(fen: &str, hint: Option<Move>, killers: [Option<Move>; 2]) -> Vec<(String, i32)> {
        let (board, side) = parse_position(fen).unwrap();
        let (mut moves, pins) = legal_moves(&board, side);
        let weights = OrderingWeights::default();
        let params = EvalParams::default();
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers,
            hint,
        };
        sort_moves::<MainSearchPolicy>(&ctx, moves.as_mut_slice());
        moves
            .iter()
            .map(|&mv| (mv.uci(), MainSearchPolicy::score(&ctx, mv)))
            .collect()
    }

    #[test]
    fn hint_comes_first() {
        let board = Board::new();
        let hint = parse_user_move(&board, Side::White, "a2a3").unwrap();
        let order = scored(START_FEN, Some(hint), [None; 2]);
        assert_eq!(order[0].0, "a2a3");
    }

    #[test]
    fn winning_captures_before_losing_ones() {
        // pawn takes queen beats queen takes pawn
        let order = scored("4k3/8/3q4/4P3/8/8/8/3QK3 w - - 0 1", None, [None; 2]);
        assert_eq!(order[0].0, "e5d6");
        let qxd6 = order.iter().position(|(m, _)| m == "d1d6").unwrap();
        let quiet = order.iter().position(|(m, _)| m == "e1e2").unwrap();
        assert!(qxd6 < quiet);
    }

    #[test]
    fn promotions_are_tiered() {
        let order = scored("8/P6k/8/8/8/8/8/K7 w - - 0 1", None, [None; 2]);
        let rank = |uci: &str| order.iter().position(|(m, _)| m == uci).unwrap();
        assert!(rank("a7a8q") < rank("a7a8r"));
        assert!(rank("a7a8r") < rank("a7a8b"));
        assert!(rank("a7a8n") < rank("a1b1"));
    }

    #[test]
    fn killers_beat_other_quiet_moves() {
        let board = Board::new();
        let killer = parse_user_move(&board, Side::White, "h2h3").unwrap();
        let order = scored(START_FEN, None, [Some(killer), None]);
        assert_eq!(order[0].0, "h2h3");
    }

    #[test]
    fn moving_into_pawn_attacks_is_penalised() {
        // Nc3-d5 walks into the e6 pawn, Nc3-b5 does not
        let (board, side) = parse_position("4k3/8/4p3/8/8/2N5/8/4K3 w - - 0 1").unwrap();
        let (_, pins) = legal_moves(&board, side);
        let weights = OrderingWeights::default();
        let params = EvalParams::default();
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers: [None; 2],
            hint: None,
        };
        let d5 = parse_user_move(&board, side, "c3d5").unwrap();
        let pst = params.pst(Piece::Knight, side, d5.to).sum()
            - params.pst(Piece::Knight, side, d5.from).sum();
        assert_eq!(
            MainSearchPolicy::score(&ctx, d5),
            pst - weights.pawn_attacked_penalty
        );
    }

    #[test]
    fn pawn_pushes_into_pawn_attacks_take_the_larger_penalty() {
        // e4-e5 steps onto the square the d6 pawn covers
        let (board, side) = parse_position("4k3/8/3p4/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        let (_, pins) = legal_moves(&board, side);
        let weights = OrderingWeights::default();
        let params = EvalParams::default();
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers: [None; 2],
            hint: None,
        };
        let push = parse_user_move(&board, side, "e4e5").unwrap();
        let pst = params.pst(Piece::Pawn, side, push.to).sum()
            - params.pst(Piece::Pawn, side, push.from).sum();
        assert_eq!(
            MainSearchPolicy::score(&ctx, push),
            pst - weights.pawn_attacked_penalty
        );
    }

    #[test]
    fn direct_checks_get_a_bonus() {
        let (board, side) = parse_position("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let (_, pins) = legal_moves(&board, side);
        let weights = OrderingWeights::default();
        let params = EvalParams::default();
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers: [None; 2],
            hint: None,
        };
        let check = parse_user_move(&board, side, "a1a8").unwrap();
        let quiet = parse_user_move(&board, side, "a1a7").unwrap();
        assert!(gives_direct_check(&ctx, check));
        assert!(!gives_direct_check(&ctx, quiet));
    }

    #[test]
    fn killer_ring_keeps_two_newest() {
        let board = Board::new();
        let a = parse_user_move(&board, Side::White, "a2a3").unwrap();
        let b = parse_user_move(&board, Side::White, "b2b3").unwrap();
        let c = parse_user_move(&board, Side::White, "c2c3").unwrap();
        let mut killers = KillerTable::default();
        killers.insert(3, a);
        killers.insert(3, a);
        killers.insert(3, b);
        assert_eq!(killers.get(3), [Some(a), Some(b)]);
        killers.insert(3, c);
        assert_eq!(killers.get(3), [Some(c), Some(b)]);
        assert_eq!(killers.get(4), [None, None]);
        killers.clear();
        assert_eq!(killers.get(3), [None, None]);
    }
}
