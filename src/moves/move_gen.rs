//! Legal Move Generation
//!
//! Moves are produced directly as legal moves from a [`PinData`] snapshot:
//! the check mask restricts every non-king destination, pin masks keep pinned
//! pieces on their line, and the king avoids every attacked square. No move
//! is ever tried on a board copy to test legality.

use crate::{moves::move_buffer::MoveSink, prelude::*};

/// Compile-time choice of which moves [`generate`] emits.
pub trait GenMode {
    const CAPTURES_ONLY: bool;
}

/// Every legal move.
pub struct AllMoves;

/// Captures, capture-promotions and en passant. Used by quiescence search.
pub struct CapturesOnly;

impl GenMode for AllMoves {
    const CAPTURES_ONLY: bool = false;
}

impl GenMode for CapturesOnly {
    const CAPTURES_ONLY: bool = true;
}

/// Emits every legal move of `side` matching `M` into `sink`.
pub fn generate<M: GenMode, S: MoveSink>(board: &Board, side: Side, pins: &PinData, sink: &mut S) {
    let targets = if M::CAPTURES_ONLY {
        pins.targets & board.side_bb(side.flip())
    } else {
        pins.targets
    };

    gen_king_moves::<M, S>(board, side, pins, sink);
    if pins.double_check {
        return;
    }

    gen_pawn_moves::<M, S>(board, side, pins, sink);
    gen_knight_moves(board, side, pins, targets, sink);
    gen_slider_moves(board, side, pins, targets, sink);
    if !M::CAPTURES_ONLY && !pins.in_check() {
        gen_castling(board, side, pins, sink);
    }
}

/// All legal moves of `side` together with the analysis they were built from.
pub fn legal_moves(board: &Board, side: Side) -> (MoveBuffer, PinData) {
    let pins = PinData::reload(board, side);
    let mut moves = MoveBuffer::new();
    generate::<AllMoves, _>(board, side, &pins, &mut moves);
    (moves, pins)
}

/// `side` is in check and has no legal move.
pub fn is_checkmate(board: &Board, side: Side) -> bool {
    let (moves, pins) = legal_moves(board, side);
    pins.in_check() && moves.is_empty()
}

#[inline(always)]
fn push_targets<S: MoveSink>(
    board: &Board,
    side: Side,
    piece: Piece,
    from: Square,
    destinations: BitBoard,
    sink: &mut S,
) {
    for to in destinations.iter_bits() {
        let to = Square::from_index(to);
        let captured = board.piece_of(side.flip(), to);
        sink.push(Move::new(from, to, piece, MoveKind::Silent, captured));
    }
}

#[inline(always)]
fn push_promotions<S: MoveSink>(from: Square, to: Square, captured: Option<Piece>, sink: &mut S) {
    for promo in Piece::PROMOTIONS {
        sink.push(Move::new(
            from,
            to,
            Piece::Pawn,
            MoveKind::Promotion(promo),
            captured,
        ));
    }
}

fn gen_king_moves<M: GenMode, S: MoveSink>(
    board: &Board,
    side: Side,
    pins: &PinData,
    sink: &mut S,
) {
    let from = pins.king_square;
    let mut destinations = ATTACK_TABLES.king(from) & !board.side_bb(side) & !pins.attacked;
    if M::CAPTURES_ONLY {
        destinations &= board.side_bb(side.flip());
    }
    push_targets(board, side, Piece::King, from, destinations, sink);
}

fn gen_pawn_moves<M: GenMode, S: MoveSink>(
    board: &Board,
    side: Side,
    pins: &PinData,
    sink: &mut S,
) {
    let tables = &*ATTACK_TABLES;
    let them = side.flip();
    let fwd = side.forward();
    let occupied = board.occupied();
    let enemy = board.side_bb(them);
    let promotion_rank = side.promotion_rank();

    for from in board.piece_bb(side, Piece::Pawn).iter_bits() {
        let from = Square::from_index(from);
        let diag_pinned = pins.diagonal_pins.contains(from);
        let ortho_pinned = pins.orthogonal_pins.contains(from);

        if !M::CAPTURES_ONLY && !diag_pinned {
            let push_allowed = |sq: Square| {
                pins.check_mask.contains(sq)
                    && (!ortho_pinned || pins.orthogonal_pins.contains(sq))
            };
            let one = from.offset(fwd);
            if !occupied.contains(one) {
                if push_allowed(one) {
                    if one.row() == promotion_rank {
                        push_promotions(from, one, None, sink);
                    } else {
                        sink.push(Move::new(from, one, Piece::Pawn, MoveKind::Silent, None));
                    }
                }
                if from.row() == side.pawn_rank() {
                    let two = one.offset(fwd);
                    if !occupied.contains(two) && push_allowed(two) {
                        sink.push(Move::new(from, two, Piece::Pawn, MoveKind::DoublePush, None));
                    }
                }
            }
        }

        // a pawn pinned along a rank or file can never capture
        if ortho_pinned {
            continue;
        }

        let attacks = tables.pawn_attacks(from, side);
        let mut captures = attacks & enemy & pins.check_mask;
        if diag_pinned {
            captures &= pins.diagonal_pins;
        }
        for to in captures.iter_bits() {
            let to = Square::from_index(to);
            let captured = board.piece_of(them, to);
            if to.row() == promotion_rank {
                push_promotions(from, to, captured, sink);
            } else {
                sink.push(Move::new(from, to, Piece::Pawn, MoveKind::Silent, captured));
            }
        }

        let Some(ep) = board.enpassant_square else {
            continue;
        };
        if !attacks.contains(ep) || pins.ep_pin_blocked {
            continue;
        }
        let victim = ep.offset(-fwd);
        // blocks a slider check by landing on the ray, or removes the checking pawn
        let resolves_check = pins.check_mask.contains(ep) || pins.check_mask.contains(victim);
        let stays_on_pin = !diag_pinned || pins.diagonal_pins.contains(ep);
        if resolves_check && stays_on_pin {
            sink.push(Move::new(
                from,
                ep,
                Piece::Pawn,
                MoveKind::EnPassant,
                Some(Piece::Pawn),
            ));
        }
    }
}

fn gen_knight_moves<S: MoveSink>(
    board: &Board,
    side: Side,
    pins: &PinData,
    targets: BitBoard,
    sink: &mut S,
) {
    let pinned = pins.diagonal_pins | pins.orthogonal_pins;
    let knights = board.piece_bb(side, Piece::Knight) & !pinned;
    for from in knights.iter_bits() {
        let from = Square::from_index(from);
        push_targets(
            board,
            side,
            Piece::Knight,
            from,
            ATTACK_TABLES.knight(from) & targets,
            sink,
        );
    }
}

fn gen_slider_moves<S: MoveSink>(
    board: &Board,
    side: Side,
    pins: &PinData,
    targets: BitBoard,
    sink: &mut S,
) {
    let tables = &*ATTACK_TABLES;
    let occupied = board.occupied();

    for from in (board.piece_bb(side, Piece::Bishop) & !pins.orthogonal_pins).iter_bits() {
        let from = Square::from_index(from);
        let mut destinations = tables.bishop_attacks(from, occupied) & targets;
        if pins.diagonal_pins.contains(from) {
            destinations &= pins.diagonal_pins;
        }
        push_targets(board, side, Piece::Bishop, from, destinations, sink);
    }

    for from in (board.piece_bb(side, Piece::Rook) & !pins.diagonal_pins).iter_bits() {
        let from = Square::from_index(from);
        let mut destinations = tables.rook_attacks(from, occupied) & targets;
        if pins.orthogonal_pins.contains(from) {
            destinations &= pins.orthogonal_pins;
        }
        push_targets(board, side, Piece::Rook, from, destinations, sink);
    }

    for from in board.piece_bb(side, Piece::Queen).iter_bits() {
        let from = Square::from_index(from);
        let destinations = if pins.diagonal_pins.contains(from) {
            tables.bishop_attacks(from, occupied) & targets & pins.diagonal_pins
        } else if pins.orthogonal_pins.contains(from) {
            tables.rook_attacks(from, occupied) & targets & pins.orthogonal_pins
        } else {
            tables.queen_attacks(from, occupied) & targets
        };
        push_targets(board, side, Piece::Queen, from, destinations, sink);
    }
}

fn gen_castling<S: MoveSink>(board: &Board, side: Side, pins: &PinData, sink: &mut S) {
    let base = side.back_rank() * 8;
    let home = Square::from_index(base + 4);
    if pins.king_square != home {
        return;
    }
    let occupied = board.occupied();
    let rooks = board.piece_bb(side, Piece::Rook);
    let bb = |files: &[usize]| {
        files
            .iter()
            .fold(BitBoard::EMPTY, |acc, f| acc | BitBoard(1 << (base + f)))
    };

    // (kingside, rook file, must be empty, king passes through)
    let wings = [
        (true, 7, bb(&[5, 6]), bb(&[5, 6])),
        (false, 0, bb(&[1, 2, 3]), bb(&[2, 3])),
    ];
    for (kingside, rook_file, empty, path) in wings {
        if !board.castling_rights.can_castle(side, kingside)
            || !rooks.contains_square(base + rook_file)
            || (occupied & empty).any()
            || (pins.attacked & path).any()
        {
            continue;
        }
        let (to, kind) = if kingside {
            (Square::from_index(base + 6), MoveKind::ShortCastle)
        } else {
            (Square::from_index(base + 2), MoveKind::LongCastle)
        };
        sink.push(Move::new(home, to, Piece::King, kind, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::move_buffer::MoveCounter;

    fn moves_of(fen: &str) -> Vec<String> {
        let (board, stm) = parse_position(fen).unwrap();
        let (moves, _) = legal_moves(&board, stm);
        let mut list: Vec<String> = moves.iter().map(|m| m.uci()).collect();
        list.sort();
        list
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let (moves, pins) = legal_moves(&Board::new(), Side::White);
        assert_eq!(moves.len(), 20);
        assert!(!pins.in_check());
        let doubles = moves
            .iter()
            .filter(|m| m.kind == MoveKind::DoublePush)
            .count();
        assert_eq!(doubles, 8);
    }

    #[test]
    fn counting_sink_matches_buffer() {
        let (board, stm) = parse_position(KIWIPETE).unwrap();
        let pins = PinData::reload(&board, stm);
        let mut counter = MoveCounter::default();
        generate::<AllMoves, _>(&board, stm, &pins, &mut counter);
        assert_eq!(counter.0, 48);
    }

    #[test]
    fn captures_only_mode() {
        let (board, stm) = parse_position(KIWIPETE).unwrap();
        let pins = PinData::reload(&board, stm);
        let mut captures = MoveBuffer::new();
        generate::<CapturesOnly, _>(&board, stm, &pins, &mut captures);
        assert_eq!(captures.len(), 8);
        assert!(captures.iter().all(|m| m.is_capture()));
    }

    #[test]
    fn double_check_only_moves_king() {
        let (board, stm) = parse_position("4k3/8/8/8/8/3n4/8/r3K2R w K - 0 1").unwrap();
        let (moves, pins) = legal_moves(&board, stm);
        assert!(pins.double_check);
        assert!(moves.iter().all(|m| m.piece == Piece::King));
        assert_eq!(moves_of("4k3/8/8/8/8/3n4/8/r3K2R w K - 0 1"), vec!["e1d2", "e1e2"]);
    }

    #[test]
    fn pinned_pieces_stay_on_their_line() {
        // rook pinned on the e-file may slide along it but not leave it
        let moves = moves_of("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1");
        for m in ["e2e3", "e2e4", "e2e5", "e2e6", "e2e7", "e2e8"] {
            assert!(moves.contains(&m.to_string()), "missing {m}");
        }
        assert!(!moves.contains(&"e2d2".to_string()));
        // pinned knight has no moves
        let moves = moves_of("6k1/8/8/b7/8/8/3N4/4K3 w - - 0 1");
        assert!(moves.iter().all(|m| !m.starts_with("d2")));
    }

    #[test]
    fn en_passant_captures_checking_pawn() {
        let moves = moves_of("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1");
        assert!(moves.contains(&"e4d3".to_string()));
        assert_eq!(moves.len(), 9);
    }

    #[test]
    fn en_passant_horizontal_pin_is_respected() {
        let moves = moves_of("8/8/8/KPp4r/8/8/8/7k w - c6 0 2");
        assert!(!moves.contains(&"b5c6".to_string()));
        let moves = moves_of("8/8/8/KPp5/8/8/8/7k w - c6 0 2");
        assert!(moves.contains(&"b5c6".to_string()));
    }

    #[test]
    fn castling_requires_safe_path() {
        let moves = moves_of("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // f1 attacked by the bishop on c4
        let moves = moves_of("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // b1 must be empty but may be attacked, the king never crosses it
        let moves = moves_of("r3k2r/8/8/8/8/8/8/Rn2K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1c1".to_string()));
        let moves = moves_of("1r2k2r/8/8/8/8/8/8/R3K2R w KQk - 0 1");
        assert!(moves.contains(&"e1c1".to_string()));

        // right held but rook gone
        let moves = moves_of("r3k2r/8/8/8/8/8/8/R3K3 w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".to_string()));
    }

    #[test]
    fn promotions_are_enumerated() {
        let moves = moves_of("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        for m in ["a7a8q", "a7a8r", "a7a8b", "a7a8n", "a7b8q", "a7b8r", "a7b8b", "a7b8n"] {
            assert!(moves.contains(&m.to_string()), "missing {m}");
        }
    }

    #[test]
    fn checkmate_detection() {
        assert!(is_checkmate(
            &parse_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap()
                .0,
            Side::White
        ));
        let (board, stm) = parse_position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!is_checkmate(&board, stm));
        assert!(legal_moves(&board, stm).0.is_empty());
    }
}
