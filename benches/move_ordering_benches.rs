use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use pinboard::{
    prelude::*,
    search::{
        move_ordering::{
            MainSearchPolicy, MoveScoringPolicy, OrderingContext, OrderingWeights, QSearchPolicy,
            sort_moves,
        },
        move_picker::MovePicker,
    },
};

const POSITIONS: &[(&str, &str)] = &[
    ("Start", START_FEN),
    ("Kiwipete", KIWIPETE),
    (
        "Tactical",
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1",
    ),
    ("Endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

// 100 = "no cutoff"
const CUTOFF_POINTS: &[usize] = &[1, 3, 8, 100];

fn bench_move_scoring(c: &mut Criterion) {
    let weights = OrderingWeights::default();
    let params = EvalParams::default();
    let mut group = c.benchmark_group("move_scoring");

    for (name, fen) in POSITIONS {
        let (board, side) = parse_position(fen).unwrap();
        let (moves, pins) = legal_moves(&board, side);
        let ctx = OrderingContext {
            board: &board,
            side,
            pins: &pins,
            weights: &weights,
            params: &params,
            killers: [None; 2],
            hint: None,
        };

        group.bench_with_input(
            BenchmarkId::new("main", format!("{name}_{}", moves.len())),
            &moves,
            |b, moves| {
                b.iter(|| {
                    let total: i32 = moves
                        .iter()
                        .map(|&mv| MainSearchPolicy::score(&ctx, mv))
                        .sum();
                    black_box(total)
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("qsearch", format!("{name}_{}", moves.len())),
            &moves,
            |b, moves| {
                b.iter(|| {
                    let total: i32 = moves.iter().map(|&mv| QSearchPolicy::score(&ctx, mv)).sum();
                    black_box(total)
                })
            },
        );
    }
    group.finish();
}

/// Full sort against the picker, stopping after `cutoff` moves as a beta cutoff would.
fn bench_sort_vs_picker(c: &mut Criterion) {
    let weights = OrderingWeights::default();
    let params = EvalParams::default();
    let (board, side) = parse_position(KIWIPETE).unwrap();
    let (moves, pins) = legal_moves(&board, side);
    let ctx = OrderingContext {
        board: &board,
        side,
        pins: &pins,
        weights: &weights,
        params: &params,
        killers: [None; 2],
        hint: None,
    };

    let mut group = c.benchmark_group("sort_vs_picker");
    for &cutoff in CUTOFF_POINTS {
        group.bench_with_input(BenchmarkId::new("sort", cutoff), &cutoff, |b, &cutoff| {
            b.iter_batched(
                || moves.clone(),
                |mut moves| {
                    sort_moves::<MainSearchPolicy>(&ctx, moves.as_mut_slice());
                    for mv in moves.iter().take(cutoff) {
                        black_box(mv);
                    }
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("picker", cutoff), &cutoff, |b, &cutoff| {
            b.iter_batched(
                || moves.clone(),
                |mut moves| {
                    let picker = MovePicker::new::<MainSearchPolicy>(&ctx, moves.as_mut_slice());
                    for mv in picker.take(cutoff) {
                        black_box(mv);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_move_scoring, bench_sort_vs_picker);
criterion_main!(benches);
