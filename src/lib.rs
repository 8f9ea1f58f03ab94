pub mod board;
pub mod comms;
pub mod config;
pub mod evaluation;
pub mod moves;
pub mod perft;
pub mod prelude;
pub mod search;
pub mod utils;

pub use consts::*;

pub mod consts {
    use crate::prelude::*;

    pub const NUM_SIDES: usize = Side::SIDES.len();
    pub const NUM_PIECES: usize = Piece::PIECES.len();
    pub const NUM_SQUARES: usize = 64;
    pub const NUM_CASTLING_RIGHTS: usize = 16;
    pub const NUM_FILES: usize = 8;
    pub const NUM_RANKS: usize = 8;

    /// Deepest ply the search tables can hold
    pub const MAX_PLY: usize = 128;
    pub const MAX_MOVES: usize = 256;

    pub const MIDGAME_PHASE: i32 = 0;
    pub const ENDGAME_PHASE: i32 = 256;

    pub const TOTAL_PHASE: i32 = 24;

    pub const MATE_SCORE: i32 = 30_000;
    pub const MATE_THRESHOLD: i32 = MATE_SCORE - MAX_PLY as i32;
    /// Bigger than any score the search can return
    pub const INFINITY: i32 = 32_000;

    pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    pub const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
}
