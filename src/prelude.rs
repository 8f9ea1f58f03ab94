pub use crate::board::fen::{self, parse_position};
pub use crate::board::{
    self, Board,
    components::{BitBoard, BitBoardIterator, CastlingRights, Piece, Side, Square},
    zobrist::ZobristKeys,
};
pub use crate::consts::*;
pub use crate::evaluation::{
    self, EvalParams, Evaluator, MaterialEvaluator, StandardEvaluator,
    score::{Phase, Score},
};
pub use crate::moves::{
    self, Direction, Move, MoveKind, parse_user_move,
    attack_tables::ATTACK_TABLES,
    move_buffer::MoveBuffer,
    move_gen::{self, legal_moves},
    pin_data::PinData,
};
pub use crate::search::{self, Search, SearchConfig, SearchLimits, SearchResult, SearchStats};
pub use crate::utils::{self, log::*};
pub use miette::{self, Context, IntoDiagnostic, Result};
pub use std::fmt::Display;
pub use std::str::FromStr;
pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
