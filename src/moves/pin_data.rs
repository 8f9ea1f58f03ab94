use crate::prelude::*;

/// Check and pin analysis of one side's king, rebuilt for every generated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinData {
    pub king_square: Square,
    /// Every square the opponent attacks, with our king lifted off the board
    /// so squares behind it along a checking ray count as attacked.
    pub attacked: BitBoard,
    /// Squares attacked by enemy pawns alone
    pub pawn_attacks: BitBoard,
    /// Enemy pieces giving check
    pub checkers: BitBoard,
    /// Squares a non-king move must land on. Full when not in check, empty in double check.
    pub check_mask: BitBoard,
    /// Union of king-to-pinner segments along diagonals
    pub diagonal_pins: BitBoard,
    /// Union of king-to-pinner segments along ranks and files
    pub orthogonal_pins: BitBoard,
    pub double_check: bool,
    /// Capturing en passant would clear both pawns off a rank the king shares with an enemy rook or queen.
    pub ep_pin_blocked: bool,
    /// Enemy or empty squares inside the check mask
    pub targets: BitBoard,
}

impl PinData {
    pub fn reload(board: &Board, side: Side) -> Self {
        let tables = &*ATTACK_TABLES;
        let them = side.flip();
        let king = board.king_square(side);
        let own = board.side_bb(side);
        let enemy = board.side_bb(them);
        let occupied = own | enemy;
        let without_king = occupied ^ BitBoard::from_square(king);

        let enemy_pawns = board.piece_bb(them, Piece::Pawn);
        let enemy_knights = board.piece_bb(them, Piece::Knight);
        let enemy_diag = board.diag_sliders(them);
        let enemy_ortho = board.ortho_sliders(them);

        let mut pawn_attacks = BitBoard::EMPTY;
        for sq in enemy_pawns.iter_bits() {
            pawn_attacks |= tables.pawn_attacks(Square::from_index(sq), them);
        }
        let mut attacked = pawn_attacks | tables.king(board.king_square(them));
        for sq in enemy_knights.iter_bits() {
            attacked |= tables.knight(Square::from_index(sq));
        }
        for sq in enemy_diag.iter_bits() {
            attacked |= tables.bishop_attacks(Square::from_index(sq), without_king);
        }
        for sq in enemy_ortho.iter_bits() {
            attacked |= tables.rook_attacks(Square::from_index(sq), without_king);
        }

        let leaper_checkers = (tables.pawn_attacks(king, side) & enemy_pawns)
            | (tables.knight(king) & enemy_knights);
        let slider_checkers = (tables.bishop_attacks(king, occupied) & enemy_diag)
            | (tables.rook_attacks(king, occupied) & enemy_ortho);
        let checkers = leaper_checkers | slider_checkers;

        let check_mask = match checkers.pop_count() {
            0 => BitBoard::FULL,
            1 => {
                let mut mask = leaper_checkers;
                for sq in slider_checkers.iter_bits() {
                    mask |= tables.segment(king, Square::from_index(sq));
                }
                mask
            }
            _ => BitBoard::EMPTY,
        };

        // En passant victim, when our pawns could take one this move
        let ep_victim = board
            .enpassant_square
            .filter(|_| king.row() == side.en_passant_rank())
            .map(|ep| ep.offset(-side.forward()));
        let own_pawns = board.piece_bb(side, Piece::Pawn);

        let mut diagonal_pins = BitBoard::EMPTY;
        let mut orthogonal_pins = BitBoard::EMPTY;
        let mut ep_pin_blocked = false;

        for dir in Direction::ALL {
            let sliders = if dir.is_diagonal() {
                enemy_diag
            } else {
                enemy_ortho
            };
            let Some(pinner) = (tables.ray(king, dir) & sliders).get_closest_bit(dir.is_forward())
            else {
                continue;
            };
            let segment = tables.segment(king, Square::from_index(pinner as usize));
            let own_on = segment & own;
            let enemy_on = segment & enemy;

            if own_on.pop_count() == 1 && enemy_on.pop_count() == 1 {
                if dir.is_diagonal() {
                    diagonal_pins |= segment;
                } else {
                    orthogonal_pins |= segment;
                }
            } else if let Some(victim) = ep_victim {
                let horizontal = matches!(dir, Direction::East | Direction::West);
                if horizontal
                    && own_on.pop_count() == 1
                    && (own_on & own_pawns).any()
                    && enemy_on.pop_count() == 2
                    && enemy_on.contains(victim)
                {
                    ep_pin_blocked = true;
                }
            }
        }

        Self {
            king_square: king,
            attacked,
            pawn_attacks,
            checkers,
            check_mask,
            diagonal_pins,
            orthogonal_pins,
            double_check: checkers.pop_count() > 1,
            ep_pin_blocked,
            targets: !own & check_mask,
        }
    }

    #[inline(always)]
    pub const fn in_check(&self) -> bool {
        self.checkers.any()
    }

    #[inline(always)]
    pub fn is_pinned(&self, sq: Square) -> bool {
        (self.diagonal_pins | self.orthogonal_pins).contains(sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reload(fen: &str) -> PinData {
        let (board, stm) = parse_position(fen).unwrap();
        PinData::reload(&board, stm)
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn quiet_position_has_no_restrictions() {
        let pins = reload(START_FEN);
        assert!(!pins.in_check());
        assert_eq!(pins.check_mask, BitBoard::FULL);
        assert!(pins.diagonal_pins.is_empty());
        assert!(pins.orthogonal_pins.is_empty());
        assert!(pins.attacked.contains(sq("e6")));
        assert!(pins.pawn_attacks.contains(sq("e6")));
        assert!(!pins.pawn_attacks.contains(sq("e5")));
        assert_eq!(pins.targets.pop_count(), 48);
    }

    #[test]
    fn slider_check_masks_the_ray() {
        let pins = reload("4r1k1/8/8/8/8/8/8/4K3 w - - 0 1");
        assert!(pins.in_check());
        assert!(!pins.double_check);
        assert_eq!(pins.check_mask.pop_count(), 7);
        assert!(pins.check_mask.contains(sq("e8")));
        assert!(pins.check_mask.contains(sq("e2")));
        // the rook's ray runs through the king square
        assert!(pins.attacked.contains(sq("e1")));
    }

    #[test]
    fn king_removed_from_occupancy() {
        let pins = reload("4k3/8/8/8/r3K3/8/8/8 w - - 0 1");
        assert!(pins.attacked.contains(sq("f4")));
    }

    #[test]
    fn double_check_empties_mask() {
        let pins = reload("4k3/8/8/8/8/3n4/8/r3K3 w - - 0 1");
        assert!(pins.double_check);
        assert!(pins.check_mask.is_empty());
        assert!(pins.targets.is_empty());
    }

    #[test]
    fn pins_are_split_by_axis() {
        let pins = reload("4r1k1/8/8/b7/8/8/3B4/4RK2 w - - 0 1");
        // e-file rook does not pin anything: f1 king is not on that file
        assert!(pins.orthogonal_pins.is_empty());
        let pins = reload("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1");
        assert!(pins.orthogonal_pins.contains(sq("e2")));
        assert!(pins.orthogonal_pins.contains(sq("e8")));
        assert!(pins.diagonal_pins.is_empty());
        let pins = reload("6k1/8/8/b7/8/8/3N4/4K3 w - - 0 1");
        assert!(pins.diagonal_pins.contains(sq("d2")));
        assert!(pins.diagonal_pins.contains(sq("a5")));
        assert!(pins.is_pinned(sq("d2")));
    }

    #[test]
    fn two_blockers_are_not_a_pin() {
        let pins = reload("4r1k1/8/8/8/4N3/8/4R3/4K3 w - - 0 1");
        assert!(pins.orthogonal_pins.is_empty());
    }

    #[test]
    fn en_passant_through_two_pawns_is_blocked() {
        let pins = reload("8/8/8/KPp4r/8/8/8/7k w - c6 0 2");
        assert!(pins.ep_pin_blocked);
        assert!(pins.orthogonal_pins.is_empty());

        let pins = reload("8/8/8/KPp5/8/8/8/7k w - c6 0 2");
        assert!(!pins.ep_pin_blocked);
    }
}
