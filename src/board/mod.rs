use std::fmt::{self, Write};

use crate::prelude::*;

pub mod components;
pub mod fen;
pub mod make_move;
pub mod zobrist;

/// Position without the side to move.
///
/// Pawns through queens live in one bitboard per side and type, kings are
/// kept as plain squares. Every transition produces a new value (see
/// [`Board::fork`]), so search branches never alias each other.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Board {
    /// [Pawn, Knight, Bishop, Rook, Queen] per side
    pub pieces: [[BitBoard; 5]; NUM_SIDES],
    pub kings: [Square; NUM_SIDES],
    /// Square a pawn skipped over on the last double push
    pub enpassant_square: Option<Square>,
    pub castling_rights: CastlingRights,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard starting position.
    pub const fn new() -> Self {
        Self {
            pieces: [
                [
                    BitBoard(0x0000_0000_0000_FF00),
                    BitBoard(0x0000_0000_0000_0042),
                    BitBoard(0x0000_0000_0000_0024),
                    BitBoard(0x0000_0000_0000_0081),
                    BitBoard(0x0000_0000_0000_0008),
                ],
                [
                    BitBoard(0x00FF_0000_0000_0000),
                    BitBoard(0x4200_0000_0000_0000),
                    BitBoard(0x2400_0000_0000_0000),
                    BitBoard(0x8100_0000_0000_0000),
                    BitBoard(0x0800_0000_0000_0000),
                ],
            ],
            kings: [Square::E1, Square::E8],
            enpassant_square: None,
            castling_rights: CastlingRights::all(),
        }
    }

    /// Board holding only the two kings. Used as a scratch base by the FEN parser.
    pub(crate) const fn with_kings(white: Square, black: Square) -> Self {
        Self {
            pieces: [[BitBoard::EMPTY; 5]; NUM_SIDES],
            kings: [white, black],
            enpassant_square: None,
            castling_rights: CastlingRights::empty(),
        }
    }

    #[inline(always)]
    pub const fn king_square(&self, side: Side) -> Square {
        self.kings[side.index()]
    }

    /// Bitboard for a piece type. The king is materialised from its square.
    #[inline(always)]
    pub const fn piece_bb(&self, side: Side, piece: Piece) -> BitBoard {
        match piece {
            Piece::King => BitBoard::from_square(self.kings[side.index()]),
            _ => self.pieces[side.index()][piece.index()],
        }
    }

    #[inline(always)]
    pub fn piece_bb_mut(&mut self, side: Side, piece: Piece) -> &mut BitBoard {
        debug_assert!(piece != Piece::King, "kings are not stored in bitboards");
        &mut self.pieces[side.index()][piece.index()]
    }

    #[inline(always)]
    pub fn side_bb(&self, side: Side) -> BitBoard {
        let p = &self.pieces[side.index()];
        p[0] | p[1] | p[2] | p[3] | p[4] | BitBoard::from_square(self.kings[side.index()])
    }

    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.side_bb(Side::White) | self.side_bb(Side::Black)
    }

    #[inline(always)]
    pub const fn ortho_sliders(&self, side: Side) -> BitBoard {
        let p = &self.pieces[side.index()];
        BitBoard(p[Piece::Rook.index()].0 | p[Piece::Queen.index()].0)
    }

    #[inline(always)]
    pub const fn diag_sliders(&self, side: Side) -> BitBoard {
        let p = &self.pieces[side.index()];
        BitBoard(p[Piece::Bishop.index()].0 | p[Piece::Queen.index()].0)
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Side)> {
        for side in Side::SIDES {
            if self.kings[side.index()] == sq {
                return Some((Piece::King, side));
            }
            if let Some(piece) = self.piece_of(side, sq) {
                return Some((piece, side));
            }
        }
        None
    }

    /// Non-king piece of `side` standing on `sq`.
    #[inline(always)]
    pub fn piece_of(&self, side: Side, sq: Square) -> Option<Piece> {
        Piece::BITBOARD_PIECES
            .into_iter()
            .find(|p| self.pieces[side.index()][p.index()].contains(sq))
    }

    /// Pieces of `by` attacking `sq` with the given occupancy.
    pub fn attackers_to(&self, sq: Square, by: Side, occupied: BitBoard) -> BitBoard {
        let tables = &*ATTACK_TABLES;
        let p = &self.pieces[by.index()];
        (tables.pawn_attacks(sq, !by) & p[Piece::Pawn.index()])
            | (tables.knight(sq) & p[Piece::Knight.index()])
            | (tables.king(sq) & BitBoard::from_square(self.kings[by.index()]))
            | (tables.bishop_attacks(sq, occupied) & self.diag_sliders(by))
            | (tables.rook_attacks(sq, occupied) & self.ortho_sliders(by))
    }

    pub fn is_square_attacked(&self, sq: Square, by: Side) -> bool {
        self.attackers_to(sq, by, self.occupied()).any()
    }

    pub fn in_check(&self, side: Side) -> bool {
        self.is_square_attacked(self.king_square(side), !side)
    }

    /// Remaining non-pawn material in phase units: [`TOTAL_PHASE`] with every piece
    /// on the board, 0 with only kings and pawns left.
    pub fn material_phase(&self) -> i32 {
        Side::SIDES
            .iter()
            .flat_map(|&side| {
                Piece::BITBOARD_PIECES
                    .iter()
                    .map(move |&piece| (side, piece))
            })
            .map(|(side, piece)| self.piece_bb(side, piece).pop_count() as i32 * piece.phase())
            .sum::<i32>()
            .min(TOTAL_PHASE)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..NUM_RANKS).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..NUM_FILES {
                let sq = Square::from_index(rank * 8 + file);
                let c = self
                    .piece_at(sq)
                    .map_or('.', |(piece, side)| piece.to_char(side));
                f.write_char(c)?;
                if file < NUM_FILES - 1 {
                    f.write_char(' ')?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")?;
        writeln!(f)?;
        writeln!(f, "Castling: {}", self.castling_rights)?;
        match self.enpassant_square {
            Some(sq) => writeln!(f, "En passant: {sq}"),
            None => writeln!(f, "En passant: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_layout() {
        let board = Board::new();
        assert_eq!(board.side_bb(Side::White).pop_count(), 16);
        assert_eq!(board.side_bb(Side::Black).pop_count(), 16);
        assert_eq!(board.occupied().0, 0xFFFF_0000_0000_FFFF);
        assert_eq!(
            board.piece_at(Square::from_index(3)),
            Some((Piece::Queen, Side::White))
        );
        assert_eq!(
            board.piece_at(Square::E8),
            Some((Piece::King, Side::Black))
        );
        assert_eq!(board.piece_at(Square::from_index(28)), None);
        assert_eq!(board.material_phase(), TOTAL_PHASE);
    }

    #[test]
    fn start_position_not_in_check() {
        let board = Board::new();
        assert!(!board.in_check(Side::White));
        assert!(!board.in_check(Side::Black));
        assert!(board.is_square_attacked(Square::from_index(20), Side::White));
        assert!(!board.is_square_attacked(Square::from_index(28), Side::White));
    }

    #[test]
    fn display_renders_diagram() {
        let out = Board::new().to_string();
        assert!(out.starts_with("8 r n b q k b n r"));
        assert!(out.contains("1 R N B Q K B N R"));
        assert!(out.contains("Castling: KQkq"));
    }
}
