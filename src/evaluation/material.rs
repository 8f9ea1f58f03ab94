use crate::prelude::*;

/// White material minus black material. Kings are not counted.
pub fn eval_material(board: &Board, params: &EvalParams) -> i32 {
    Piece::BITBOARD_PIECES
        .iter()
        .map(|&piece| {
            let white = board.piece_bb(Side::White, piece).pop_count() as i32;
            let black = board.piece_bb(Side::Black, piece).pop_count() as i32;
            (white - black) * params.material(piece)
        })
        .sum()
}
