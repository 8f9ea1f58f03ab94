use std::time::{Duration, Instant};

use crate::{
    moves::{
        move_buffer::MoveCounter,
        move_gen::{AllMoves, generate},
    },
    prelude::*,
};

#[derive(Debug)]
pub struct PerftResult {
    /// Total leaf nodes counted
    pub nodes: u64,
    pub duration: Duration,
    pub nps: u64,
    /// Per root move breakdown, only filled by divide
    pub move_counts: Option<Vec<(Move, u64)>>,
}

impl PerftResult {
    pub fn new(nodes: u64, duration: Duration, move_counts: Option<Vec<(Move, u64)>>) -> Self {
        let micros = duration.as_micros().max(1) as u64;
        Self {
            nodes,
            duration,
            nps: nodes.saturating_mul(1_000_000) / micros,
            move_counts,
        }
    }
}

/// Leaf count of the legal move tree below `board`, bulk counting the last ply.
pub fn count_nodes(board: &Board, side: Side, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let pins = PinData::reload(board, side);
    if depth == 1 {
        let mut counter = MoveCounter::default();
        generate::<AllMoves, _>(board, side, &pins, &mut counter);
        return counter.0;
    }

    let mut moves = MoveBuffer::new();
    generate::<AllMoves, _>(board, side, &pins, &mut moves);
    moves
        .iter()
        .map(|&mv| count_nodes(&board.fork(side, mv), side.flip(), depth - 1))
        .sum()
}

pub fn perft(board: &Board, side: Side, depth: u8) -> PerftResult {
    let start = Instant::now();
    let nodes = count_nodes(board, side, depth);
    PerftResult::new(nodes, start.elapsed(), None)
}

/// Perft with a node count for every root move.
pub fn perft_divide(board: &Board, side: Side, depth: u8) -> PerftResult {
    let start = Instant::now();
    let (moves, _) = legal_moves(board, side);
    let counts: Vec<(Move, u64)> = moves
        .iter()
        .map(|&mv| {
            let nodes = count_nodes(&board.fork(side, mv), side.flip(), depth.saturating_sub(1));
            (mv, nodes)
        })
        .collect();
    let nodes = counts.iter().map(|(_, n)| n).sum();
    PerftResult::new(nodes, start.elapsed(), Some(counts))
}

/// Root moves counted on the rayon pool, each branch on its own board copy.
#[cfg(feature = "parallel")]
pub fn perft_parallel(
    board: &Board,
    side: Side,
    depth: u8,
    progress_bar: Option<&indicatif::ProgressBar>,
) -> PerftResult {
    use rayon::prelude::*;

    let start = Instant::now();
    let (moves, _) = legal_moves(board, side);
    if let Some(pb) = progress_bar {
        pb.set_length(moves.len() as u64);
    }
    let counts: Vec<(Move, u64)> = moves
        .as_slice()
        .par_iter()
        .map(|&mv| {
            let nodes = count_nodes(&board.fork(side, mv), side.flip(), depth.saturating_sub(1));
            if let Some(pb) = progress_bar {
                pb.inc(1);
            }
            (mv, nodes)
        })
        .collect();
    let nodes = counts.iter().map(|(_, n)| n).sum();
    PerftResult::new(nodes, start.elapsed(), Some(counts))
}

/// Prints a divide breakdown in the format GUI tools diff against.
pub fn print_divide(result: &PerftResult, depth: u8) {
    println!("Perft results at depth {depth}");
    println!("----------------------------");
    if let Some(ref move_counts) = result.move_counts {
        let mut sorted: Vec<_> = move_counts.iter().collect();
        sorted.sort_by_key(|(mv, _)| mv.uci());
        for (mv, count) in sorted {
            println!("{mv}: {count}");
        }
    }
    println!("----------------------------");
    println!("Total nodes: {}", result.nodes);
    println!("Time: {} ms", result.duration.as_millis());
    println!("Nodes per second: {}", result.nps);
}

/// Runs perft for depths 1 through max_depth
pub fn run_perft_suite(board: &Board, side: Side, max_depth: u8) {
    println!("Running Perft suite up to depth {max_depth}");
    println!("----------------------------");

    for depth in 1..=max_depth {
        let result = perft(board, side, depth);
        println!(
            "Depth {}: {} nodes in {} ms ({} nps)",
            depth,
            result.nodes,
            result.duration.as_millis(),
            result.nps
        );
    }

    println!("----------------------------");
}

#[cfg(test)]
mod perft_tests {
    use super::*;

    fn check(fen: &str, expected: &[(u8, u64)]) {
        init();
        let (board, stm) = parse_position(fen).unwrap();
        for &(depth, nodes) in expected {
            let result = perft(&board, stm, depth);
            assert_eq!(
                result.nodes, nodes,
                "Perft failed for {fen} at depth {depth}: got {} expected {nodes}",
                result.nodes
            );
        }
    }

    #[test]
    fn test_perft_starting_position() {
        check(
            START_FEN,
            &[(1, 20), (2, 400), (3, 8902), (4, 197_281), (5, 4_865_609)],
        );
    }

    #[test]
    #[ignore = "slow"]
    fn test_perft_starting_position_deep() {
        check(START_FEN, &[(6, 119_060_324), (7, 3_195_901_860)]);
    }

    #[test]
    fn test_perft_kiwipete() {
        check(
            KIWIPETE,
            &[(1, 48), (2, 2039), (3, 97_862), (4, 4_085_603)],
        );
    }

    #[test]
    #[ignore = "slow"]
    fn test_perft_kiwipete_deep() {
        check(KIWIPETE, &[(5, 193_690_690)]);
    }

    #[test]
    fn test_perft_en_passant_pin() {
        check("8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", &[(6, 1_440_467)]);
    }

    #[test]
    fn test_perft_position3() {
        check(
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            &[(1, 14), (2, 191), (3, 2812), (4, 43_238), (5, 674_624)],
        );
    }

    #[test]
    fn test_perft_position4() {
        check(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[(1, 6), (2, 264), (3, 9467), (4, 422_333)],
        );
    }

    #[test]
    fn test_perft_position5() {
        check(
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[(1, 44), (2, 1486), (3, 62_379)],
        );
    }

    #[test]
    fn test_divide_sums_to_total() {
        init();
        let (board, stm) = parse_position(KIWIPETE).unwrap();
        let divide = perft_divide(&board, stm, 3);
        let counts = divide.move_counts.unwrap();
        assert_eq!(counts.len(), 48);
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<u64>(), 97_862);
        assert_eq!(divide.nodes, 97_862);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        init();
        let (board, stm) = parse_position(KIWIPETE).unwrap();
        let parallel = perft_parallel(&board, stm, 3, None);
        assert_eq!(parallel.nodes, 97_862);
    }
}
