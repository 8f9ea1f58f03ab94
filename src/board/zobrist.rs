use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::prelude::*;

/// Random keys for full-recompute position hashing.
///
/// One instance is owned by each search. Seeded keys are reproducible across
/// runs, unseeded ones are drawn from the clock.
#[derive(Debug, Clone)]
pub struct ZobristKeys {
    /// For each square, one key per (side, piece) pair: `side * 6 + piece`
    pub pieces: [[u64; NUM_SIDES * NUM_PIECES]; NUM_SQUARES],
    /// For each of the 16 possible castling rights states
    pub castling: [u64; NUM_CASTLING_RIGHTS],
    /// Folded in only when an en passant capture is actually available
    pub en_passant_file: [u64; NUM_FILES],
    pub black_to_move: u64,
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ZobristKeys {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            chrono::Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default() as u64
        });
        trace!("Generating zobrist keys with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);

        let mut keys = Self {
            pieces: [[0; NUM_SIDES * NUM_PIECES]; NUM_SQUARES],
            castling: [0; NUM_CASTLING_RIGHTS],
            en_passant_file: [0; NUM_FILES],
            black_to_move: rng.random(),
        };

        for square in keys.pieces.iter_mut() {
            for key in square.iter_mut() {
                *key = rng.random();
            }
        }
        for key in keys.castling.iter_mut() {
            *key = rng.random();
        }
        for key in keys.en_passant_file.iter_mut() {
            *key = rng.random();
        }

        keys
    }

    #[inline(always)]
    pub const fn piece_key(&self, side: Side, piece: Piece, sq: usize) -> u64 {
        self.pieces[sq][side.index() * NUM_PIECES + piece.index()]
    }

    /// Hash of `board` with `stm` to move, recomputed from scratch.
    pub fn hash(&self, board: &Board, stm: Side) -> u64 {
        let mut hash = 0;

        for side in Side::SIDES {
            for piece in Piece::BITBOARD_PIECES {
                for sq in board.piece_bb(side, piece).iter_bits() {
                    hash ^= self.piece_key(side, piece, sq);
                }
            }
            hash ^= self.piece_key(side, Piece::King, board.king_square(side).index());
        }

        hash ^= self.castling[board.castling_rights.index()];

        if let Some(ep_sq) = board.enpassant_square {
            let our_pawns = board.piece_bb(stm, Piece::Pawn);
            // squares from which a pawn of `stm` would attack the ep square
            let capturers = ATTACK_TABLES.pawn_attacks(ep_sq, stm.flip());
            if (our_pawns & capturers).any() {
                hash ^= self.en_passant_file[ep_sq.col()];
            }
        }

        if stm == Side::Black {
            hash ^= self.black_to_move;
        }

        hash
    }
}
