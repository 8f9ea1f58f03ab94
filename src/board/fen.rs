use std::fmt::Write;

use crate::prelude::*;

/// Parses a FEN record into a board and the side to move.
///
/// Piece placement, side to move, castling rights and the en passant square
/// are required. The halfmove clock and fullmove counter are validated when
/// present but otherwise ignored, since the board keeps no move counters.
pub fn parse_position(fen: &str) -> miette::Result<(Board, Side)> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    miette::ensure!(
        (4..=6).contains(&parts.len()),
        "FEN needs 4 to 6 space separated fields, found {} in {fen:?}",
        parts.len()
    );

    let mut board = place_pieces(parts[0])
        .with_context(|| format!("Placing pieces from {:?}", parts[0]))?;
    let stm = parse_stm(parts[1]).with_context(|| format!("parsed stm input: {}", parts[1]))?;
    board.castling_rights =
        parse_castle(parts[2]).with_context(|| format!("parsed input castle: {}", parts[2]))?;
    board.enpassant_square = parse_enpassant(parts[3], stm)
        .with_context(|| format!("parsed input enpassant: {}", parts[3]))?;

    for counter in parts.iter().skip(4) {
        counter
            .parse::<u32>()
            .into_diagnostic()
            .with_context(|| format!("attempt to parse move counter {counter:?}"))?;
    }

    // Also rules out touching kings
    miette::ensure!(
        !board.in_check(!stm),
        "{stm} to move but {} is already in check",
        !stm
    );

    Ok((board, stm))
}

fn place_pieces(placement: &str) -> miette::Result<Board> {
    let ranks: Vec<&str> = placement.split('/').collect();
    miette::ensure!(
        ranks.len() == NUM_RANKS,
        "Piece placement needs 8 ranks, found {}",
        ranks.len()
    );

    let mut kings: [Option<Square>; NUM_SIDES] = [None; NUM_SIDES];
    let mut pieces = [[BitBoard::EMPTY; 5]; NUM_SIDES];

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = NUM_RANKS - 1 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                miette::ensure!(
                    (1..=8).contains(&skip),
                    "Invalid empty-square count {c:?} on rank {}",
                    rank + 1
                );
                file += skip as usize;
                continue;
            }
            let (piece, side) =
                Piece::from_char(c).with_context(|| format!("Unknown piece character {c:?}"))?;
            let sq = Square::from_coords(file, rank)
                .with_context(|| format!("Rank {} has more than 8 files", rank + 1))?;
            match piece {
                Piece::King => {
                    miette::ensure!(
                        kings[side.index()].is_none(),
                        "{side} has more than one king"
                    );
                    kings[side.index()] = Some(sq);
                }
                Piece::Pawn => {
                    miette::ensure!(
                        rank != 0 && rank != 7,
                        "Pawn on back rank at {sq}"
                    );
                    pieces[side.index()][piece.index()].set(sq.index());
                }
                _ => pieces[side.index()][piece.index()].set(sq.index()),
            }
            file += 1;
        }
        miette::ensure!(
            file == NUM_FILES,
            "Rank {} describes {file} files instead of 8",
            rank + 1
        );
    }

    let white = kings[Side::White.index()].context("White king is missing")?;
    let black = kings[Side::Black.index()].context("Black king is missing")?;
    let mut board = Board::with_kings(white, black);
    board.pieces = pieces;
    Ok(board)
}

fn parse_stm(stm: &str) -> miette::Result<Side> {
    match stm {
        "w" => Ok(Side::White),
        "b" => Ok(Side::Black),
        _ => miette::bail!("Invalid side to move, expected 'w' or 'b'"),
    }
}

fn parse_castle(castle: &str) -> miette::Result<CastlingRights> {
    if castle == "-" {
        return Ok(CastlingRights::empty());
    }
    let mut res = CastlingRights::empty();
    for c in castle.chars() {
        match c {
            'K' => res.add_right(CastlingRights::WHITE_00),
            'Q' => res.add_right(CastlingRights::WHITE_000),
            'k' => res.add_right(CastlingRights::BLACK_00),
            'q' => res.add_right(CastlingRights::BLACK_000),
            _ => miette::bail!("Unexpected character {c:?} while parsing castling rights"),
        };
    }
    Ok(res)
}

fn parse_enpassant(enpassant: &str, stm: Side) -> miette::Result<Option<Square>> {
    if enpassant == "-" {
        return Ok(None);
    }
    let square: Square = enpassant.parse()?;
    // the pawn that just moved belongs to the opponent
    let expected_rank = if stm.is_white() { 5 } else { 2 };
    miette::ensure!(
        square.row() == expected_rank,
        "En passant square {square} must be on rank {} when {stm} is to move",
        expected_rank + 1
    );
    Ok(Some(square))
}

impl Board {
    /// FEN record of this board with `stm` to move. Move counters are written as `0 1`.
    pub fn to_fen(&self, stm: Side) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..NUM_RANKS).rev() {
            let mut empty_count = 0;
            for file in 0..NUM_FILES {
                match self.piece_at(Square::from_index(rank * 8 + file)) {
                    Some((piece, side)) => {
                        if empty_count > 0 {
                            let _ = write!(fen, "{empty_count}");
                            empty_count = 0;
                        }
                        fen.push(piece.to_char(side));
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                let _ = write!(fen, "{empty_count}");
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let stm = if stm.is_white() { 'w' } else { 'b' };
        let ep = self
            .enpassant_square
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        let _ = write!(fen, " {stm} {} {ep} 0 1", self.castling_rights);
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_fen() {
        let (board, stm) = parse_position(START_FEN).unwrap();
        assert_eq!(stm, Side::White);
        assert_eq!(board, Board::new());
        assert_eq!(board.castling_rights, CastlingRights::all());
        assert_eq!(board.enpassant_square, None);
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            START_FEN,
            KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1",
        ] {
            let (board, stm) = parse_position(fen).unwrap();
            assert_eq!(board.to_fen(stm), fen);
        }
    }

    #[test]
    fn test_four_field_fen_accepted() {
        let (board, stm) = parse_position("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(stm, Side::Black);
        assert_eq!(board.king_square(Side::Black), Square::E8);
    }

    #[test]
    fn test_parse_enpassant() {
        assert_eq!(
            parse_enpassant("e3", Side::Black).unwrap(),
            Some(Square::from_index(20))
        );
        assert_eq!(parse_enpassant("-", Side::White).unwrap(), None);
        assert!(parse_enpassant("e", Side::White).is_err());
        assert!(parse_enpassant("", Side::White).is_err());
        // rank must match the side that just double pushed
        assert!(parse_enpassant("e3", Side::White).is_err());
        assert!(parse_enpassant("e4", Side::Black).is_err());
    }

    #[test]
    fn test_malformed_fens_are_rejected() {
        for fen in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq -",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w kq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKKBNR w kq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - zero 1",
            "rnbqkbnz/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "4k3/4R3/8/8/8/8/8/4K3 w - - 0 1",
            "8/8/8/3kK3/8/8/8/8 w - - 0 1",
        ] {
            assert!(parse_position(fen).is_err(), "accepted malformed {fen:?}");
        }
    }
}
