use crate::prelude::*;

/// Rook squares toggled by castling, as `(from | to)`.
#[inline(always)]
const fn castle_rook_mask(side: Side, kingside: bool) -> BitBoard {
    let mask: u64 = if kingside {
        (1 << 7) | (1 << 5)
    } else {
        (1 << 0) | (1 << 3)
    };
    match side {
        Side::White => BitBoard(mask),
        Side::Black => BitBoard(mask << 56),
    }
}

impl Board {
    /// Successor board after `side` plays `mv`. The receiver is left untouched.
    #[inline]
    pub fn fork(&self, side: Side, mv: Move) -> Board {
        let mut next = *self;
        next.make_move(side, mv);
        next
    }

    /// Applies `mv` for `side` in place.
    ///
    /// Moves are trusted to come from the generator (or from
    /// [`parse_user_move`](crate::moves::parse_user_move), which validates
    /// against it). A move whose kind contradicts its piece is a bug and panics.
    pub fn make_move(&mut self, side: Side, mv: Move) {
        let us = side.index();
        let them = side.flip().index();
        let to_bb = BitBoard::from_square(mv.to);
        let from_to = BitBoard::from_square(mv.from) | to_bb;

        debug_assert!(
            self.kings[them] != mv.to,
            "move {mv} captures the enemy king"
        );
        debug_assert!(
            self.piece_bb(side, mv.piece).contains(mv.from),
            "no {} on {} for move {mv}",
            mv.piece,
            mv.from
        );

        for bb in &mut self.pieces[them] {
            *bb &= !to_bb;
        }
        self.enpassant_square = None;

        match mv.kind {
            MoveKind::Silent => match mv.piece {
                Piece::King => self.kings[us] = mv.to,
                piece => self.pieces[us][piece.index()] ^= from_to,
            },
            MoveKind::DoublePush => {
                assert_eq!(mv.piece, Piece::Pawn, "double push by {}", mv.piece);
                self.pieces[us][Piece::Pawn.index()] ^= from_to;
                self.enpassant_square = Some(mv.from.offset(side.forward()));
            }
            MoveKind::EnPassant => {
                assert_eq!(mv.piece, Piece::Pawn, "en passant by {}", mv.piece);
                self.pieces[us][Piece::Pawn.index()] ^= from_to;
                let victim = mv.to.offset(-side.forward());
                self.pieces[them][Piece::Pawn.index()].capture(victim.index());
            }
            MoveKind::Promotion(promo) => {
                assert_eq!(mv.piece, Piece::Pawn, "promotion by {}", mv.piece);
                assert!(
                    !matches!(promo, Piece::Pawn | Piece::King),
                    "cannot promote to {promo}"
                );
                self.pieces[us][Piece::Pawn.index()].capture(mv.from.index());
                self.pieces[us][promo.index()] |= to_bb;
            }
            MoveKind::ShortCastle | MoveKind::LongCastle => {
                assert_eq!(mv.piece, Piece::King, "castling by {}", mv.piece);
                let kingside = mv.kind == MoveKind::ShortCastle;
                self.kings[us] = mv.to;
                self.pieces[us][Piece::Rook.index()] ^= castle_rook_mask(side, kingside);
            }
        }

        self.castling_rights
            .remove_right(CastlingRights::lost_on(mv.from) | CastlingRights::lost_on(mv.to));
    }
}
