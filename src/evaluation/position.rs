use crate::prelude::*;

/// Piece-square bonuses for both sides, white minus black, untapered.
pub fn eval_position(board: &Board, params: &EvalParams) -> Score {
    let mut score = Score::default();

    for side in Side::SIDES {
        let mut side_score = Score::default();
        for piece in Piece::BITBOARD_PIECES {
            for idx in board.piece_bb(side, piece).iter_bits() {
                side_score += params.pst(piece, side, Square::from_index(idx));
            }
        }
        side_score += params.pst(Piece::King, side, board.king_square(side));

        if side.is_white() {
            score += side_score;
        } else {
            score -= side_score;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_cancels_out() {
        let params = EvalParams::default();
        assert_eq!(eval_position(&Board::new(), &params), Score::default());
    }

    #[test]
    fn advanced_pawn_scores_higher() {
        let params = EvalParams::default();
        let (near, _) = parse_position("4k3/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let (far, _) = parse_position("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let near = eval_position(&near, &params);
        let far = eval_position(&far, &params);
        assert!(near.eg > far.eg);
    }
}
