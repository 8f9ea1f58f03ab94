use std::fmt::{self, Display};

use crate::prelude::*;

pub mod attack_tables;
pub mod move_buffer;
pub mod move_gen;
pub mod pin_data;


/// First 4 are orthogonal, rest are diagonal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// (rank, file) step
    #[inline(always)]
    pub const fn deltas(self) -> (i8, i8) {
        match self {
            Direction::North => (1, 0),
            Direction::South => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (1, -1),
            Direction::SouthEast => (-1, 1),
            Direction::SouthWest => (-1, -1),
        }
    }

    #[inline(always)]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::NorthWest | Direction::SouthEast | Direction::SouthWest
        )
    }

    /// Whether squares along the ray have increasing indices.
    #[inline(always)]
    pub const fn is_forward(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest
        )
    }
}

/// What a move does beyond relocating the moved piece.
///
/// Castling-rights changes are not part of the kind: the applier derives
/// them from the squares a move touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Silent,
    DoublePush,
    EnPassant,
    Promotion(Piece),
    ShortCastle,
    LongCastle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub kind: MoveKind,
    /// Piece removed by this move, if any. En passant captures a pawn.
    pub captured: Option<Piece>,
}

impl Default for Move {
    fn default() -> Self {
        Self::NULL
    }
}

impl Move {
    pub const NULL: Move = Move {
        from: Square::A1,
        to: Square::A1,
        piece: Piece::Pawn,
        kind: MoveKind::Silent,
        captured: None,
    };

    #[inline(always)]
    pub const fn new(
        from: Square,
        to: Square,
        piece: Piece,
        kind: MoveKind,
        captured: Option<Piece>,
    ) -> Self {
        Self {
            from,
            to,
            piece,
            kind,
            captured,
        }
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline(always)]
    pub const fn promotion(&self) -> Option<Piece> {
        match self.kind {
            MoveKind::Promotion(p) => Some(p),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        matches!(self.kind, MoveKind::Promotion(_))
    }

    /// Neither a capture nor a promotion. Only these become killers.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self.kind, MoveKind::ShortCastle | MoveKind::LongCastle)
    }

    /// Long algebraic notation, e.g. `e2e4`, `e7e8q`, `e1g1`.
    pub fn uci(&self) -> String {
        self.to_string()
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion() {
            write!(f, "{}", p.to_char(Side::Black))?;
        }
        Ok(())
    }
}

/// Turns long algebraic text into the matching legal move for `side`.
///
/// The move kind is inferred from the board the way a GUI would send it:
/// a king hopping two files is castling, a pawn advancing two ranks is a
/// double push, a pawn moving diagonally onto the en passant square captures
/// en passant, and reaching the last rank requires a promotion suffix. The
/// result is then checked against the legal move list.
pub fn parse_user_move(board: &Board, side: Side, text: &str) -> miette::Result<Move> {
    let text = text.trim();
    miette::ensure!(
        text.is_ascii() && (text.len() == 4 || text.len() == 5),
        "Move {text:?} is not in long algebraic notation (e.g. e2e4, e7e8q)"
    );
    let from: Square = text[0..2]
        .parse()
        .with_context(|| format!("Invalid origin square in {text:?}"))?;
    let to: Square = text[2..4]
        .parse()
        .with_context(|| format!("Invalid destination square in {text:?}"))?;
    let promotion = match text.chars().nth(4) {
        None => None,
        Some(c) => match Piece::from_char(c) {
            Some((p, _)) if Piece::PROMOTIONS.contains(&p) => Some(p),
            _ => miette::bail!("Invalid promotion piece {c:?} in {text:?}"),
        },
    };

    let (piece, owner) = board
        .piece_at(from)
        .with_context(|| format!("No piece on {from}"))?;
    miette::ensure!(owner == side, "The piece on {from} belongs to {owner}");

    let captured = board.piece_of(side.flip(), to);
    let file_delta = to.col().abs_diff(from.col());
    let rank_delta = to.row().abs_diff(from.row());

    let (kind, captured) = match piece {
        Piece::King if file_delta == 2 && rank_delta == 0 => {
            if to.col() > from.col() {
                (MoveKind::ShortCastle, None)
            } else {
                (MoveKind::LongCastle, None)
            }
        }
        Piece::Pawn if to.row() == side.promotion_rank() => {
            let promo =
                promotion.with_context(|| format!("Move {text:?} needs a promotion piece"))?;
            (MoveKind::Promotion(promo), captured)
        }
        Piece::Pawn if rank_delta == 2 => (MoveKind::DoublePush, None),
        Piece::Pawn if file_delta == 1 && captured.is_none() && board.enpassant_square == Some(to) => {
            (MoveKind::EnPassant, Some(Piece::Pawn))
        }
        _ => (MoveKind::Silent, captured),
    };
    miette::ensure!(
        promotion.is_none() || matches!(kind, MoveKind::Promotion(_)),
        "Move {text:?} is not a promotion"
    );

    let mv = Move::new(from, to, piece, kind, captured);
    let (legal, _) = legal_moves(board, side);
    miette::ensure!(legal.contains(&mv), "Illegal move {text:?}");
    Ok(mv)
}
