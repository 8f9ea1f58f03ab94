use std::fmt::Debug;

use crate::prelude::*;

pub mod material;
pub mod params;
pub mod position;
pub mod score;

use material::eval_material;
use position::eval_position;

pub use params::EvalParams;

/// Static evaluation from the point of view of `side`.
pub trait Evaluator: Debug + Send + Sync {
    fn evaluate(&self, board: &Board, side: Side) -> i32;
    fn name(&self) -> &str;
}

/// Material plus tapered piece-square tables.
#[derive(Debug, Clone, Default)]
pub struct StandardEvaluator {
    params: EvalParams,
}

impl StandardEvaluator {
    pub fn new(params: EvalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EvalParams {
        &self.params
    }
}

impl Evaluator for StandardEvaluator {
    fn evaluate(&self, board: &Board, side: Side) -> i32 {
        let phase = Phase::of(board);
        let score = eval_material(board, &self.params) + eval_position(board, &self.params).taper(phase);

        if side.is_white() { score } else { -score }
    }

    fn name(&self) -> &str {
        "Standard"
    }
}

/// Counts material only. Handy for tests that want search behaviour without
/// positional noise.
#[derive(Debug, Clone, Default)]
pub struct MaterialEvaluator {
    params: EvalParams,
}

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, board: &Board, side: Side) -> i32 {
        let score = eval_material(board, &self.params);
        if side.is_white() { score } else { -score }
    }

    fn name(&self) -> &str {
        "Material"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_balanced() {
        let board = Board::new();
        let eval = StandardEvaluator::default();
        assert_eq!(eval.evaluate(&board, Side::White), 0);
        assert_eq!(eval.evaluate(&board, Side::Black), 0);
    }

    #[test]
    fn score_is_from_the_movers_perspective() {
        let (board, _) = parse_position("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let eval = StandardEvaluator::default();
        let white = eval.evaluate(&board, Side::White);
        assert!(white > 800, "{white}");
        assert_eq!(eval.evaluate(&board, Side::Black), -white);

        let material = MaterialEvaluator::default();
        assert_eq!(material.evaluate(&board, Side::White), 900);
        assert_eq!(material.evaluate(&board, Side::Black), -900);
    }

    #[test]
    fn mirrored_position_evaluates_the_same() {
        let eval = StandardEvaluator::default();
        let (board, _) = parse_position(KIWIPETE).unwrap();
        let (mirror, _) =
            parse_position("r3k2r/pppbbppp/2n2q1P/1P2p3/3pn3/BN2PNP1/P1PPQPB1/R3K2R b KQkq - 0 1")
                .unwrap();
        assert_eq!(
            eval.evaluate(&board, Side::White),
            eval.evaluate(&mirror, Side::Black)
        );
    }
}
