use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Parser;
use pinboard::comms::uci;
use pinboard::config::EngineConfig;
use pinboard::perft;
use pinboard::prelude::*;
use pinboard::utils::cli::{Cli, Commands, GameCommand, GameSubcommand};

fn main() -> miette::Result<()> {
    init();

    let cli = Cli::parse();
    if cli.verbose {
        set_log_level(Level::DEBUG)?;
    }
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };

    let span = span!(Level::DEBUG, "main");
    let _guard = span.enter();
    match cli.command {
        Some(Commands::Search { fen, depth, time }) => {
            trace!("Searching fen: {fen:?}, depth: {depth}, time: {time:?}");
            run_search(&config, &fen, depth, time)?;
        }
        Some(Commands::Perft { fen, depth, divide }) => {
            trace!("Running perft with fen: {fen:?}, depth: {depth}, divide: {divide}");
            let (board, side) = parse_position(&fen)?;
            println!("{board}");
            if divide {
                let result = perft::perft_divide(&board, side, depth);
                perft::print_divide(&result, depth);
            } else {
                run_perft(&board, side, depth);
            }
        }
        Some(Commands::Play { fen, depth }) => {
            trace!("Starting game with fen: {fen:?}, depth: {depth}");
            game_loop(&config, &fen, depth)?;
        }
        Some(Commands::Headless) => {
            trace!("Running headless over uci");
            uci::play(&config)?;
        }
        Some(Commands::DumpConfig { path }) => {
            EngineConfig::default().save_to_file(&path)?;
        }
        None => {
            println!("Starting default game");
            game_loop(&config, START_FEN, 5)?;
        }
    }
    Ok(())
}

fn run_search(config: &EngineConfig, fen: &str, depth: u8, time: Option<u64>) -> miette::Result<()> {
    let (board, side) = parse_position(fen)?;
    println!("{board}");

    let mut search_config = config.clone();
    search_config.search.emit_info = true;
    let mut search = Search::from_config(&search_config).with_limits(SearchLimits {
        max_depth: Some(depth),
        max_time: time.map(Duration::from_millis),
        max_nodes: None,
    });
    let result = search.find_best_move(&board, side);

    let pv: Vec<String> = result.pv.iter().map(|m| m.uci()).collect();
    match result.best_move {
        Some(mv) => println!("best move: {}", mv.uci()),
        None => println!("no legal moves"),
    }
    println!("score: {}", result.uci_score());
    println!("pv: {}", pv.join(" "));
    println!(
        "depth {} | {} nodes in {:?} ({} nps)",
        result.depth,
        result.nodes,
        result.time,
        result.nps()
    );
    let stats = search.stats();
    println!(
        "tt hits {}/{} | cutoffs {} | qsearch nodes {} | avg cutoff index {:.2}",
        stats.tt_hits,
        stats.tt_probes,
        stats.tt_cutoffs,
        stats.qsearch_nodes,
        stats.avg_cutoff_index()
    );
    Ok(())
}

#[cfg(feature = "parallel")]
fn run_perft(board: &Board, side: Side, depth: u8) {
    let pb = indicatif::ProgressBar::new(0);
    let result = perft::perft_parallel(board, side, depth, Some(&pb));
    pb.finish_and_clear();
    println!(
        "Depth {depth}: {} nodes in {:?} ({} nps)",
        result.nodes, result.duration, result.nps
    );
}

#[cfg(not(feature = "parallel"))]
fn run_perft(board: &Board, side: Side, depth: u8) {
    perft::run_perft_suite(board, side, depth);
}

/// Console game against the engine. The human moves first from the given position.
fn game_loop(config: &EngineConfig, fen: &str, depth: u8) -> miette::Result<()> {
    let (start_board, start_side) = parse_position(fen)?;
    let mut search = Search::from_config(config);
    let mut depth = depth;
    let mut board = start_board;
    let mut side = start_side;
    // Every earlier position, for undo and repetition
    let mut record: Vec<(Board, Side)> = Vec::new();
    // Set once the side to move has no legal moves
    let mut finished = false;

    println!("{board}");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{side:?}> ");
        std::io::stdout().flush().into_diagnostic()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.into_diagnostic()?;
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match GameCommand::parse_line(&line) {
            Ok(cmd) => cmd.cmd,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match cmd {
            GameSubcommand::Move { mv } => {
                if finished {
                    println!("The game is over, use restart, undo or fen to continue");
                    continue;
                }
                let mv = match parse_user_move(&board, side, &mv) {
                    Ok(mv) => mv,
                    Err(e) => {
                        println!("{e:?}");
                        continue;
                    }
                };
                record.push((board, side));
                board = board.fork(side, mv);
                side = !side;
                println!("{board}");

                let keys: Vec<u64> = record.iter().map(|(b, s)| search.hash(b, *s)).collect();
                search.set_history(&keys);
                let result = search.search(&board, side, depth);
                let Some(reply) = result.best_move else {
                    if let Some(outcome) = game_outcome(&board, side) {
                        println!("{outcome}");
                    }
                    finished = true;
                    continue;
                };
                println!("Engine plays {} ({})", reply.uci(), result.uci_score());
                record.push((board, side));
                board = board.fork(side, reply);
                side = !side;
                println!("{board}");
                if let Some(outcome) = game_outcome(&board, side) {
                    println!("{outcome}");
                    finished = true;
                }
            }
            GameSubcommand::Print => println!("{board}"),
            GameSubcommand::Undo => {
                // Back to the last position with the human to move
                let target = record.len().saturating_sub(2);
                if let Some(&(b, s)) = record.get(target) {
                    board = b;
                    side = s;
                    record.truncate(target);
                    finished = false;
                    println!("{board}");
                } else {
                    println!("Nothing to undo");
                }
            }
            GameSubcommand::Depth { depth: new_depth } => {
                depth = new_depth.max(1);
                info!("Search depth set to {depth}");
            }
            GameSubcommand::Eval => {
                let score = search.evaluator().evaluate(&board, side);
                println!("Static evaluation for {side:?}: {score}");
            }
            GameSubcommand::Fen { set } => match set {
                Some(fen) => match parse_position(&fen) {
                    Ok((b, s)) => {
                        board = b;
                        side = s;
                        record.clear();
                        search.clear();
                        finished = game_outcome(&board, side).is_some();
                        println!("{board}");
                    }
                    Err(e) => println!("{e:?}"),
                },
                None => println!("{}", board.to_fen(side)),
            },
            GameSubcommand::Perft { depth, divide } => {
                let depth = depth.unwrap_or(4);
                if divide {
                    let result = perft::perft_divide(&board, side, depth);
                    perft::print_divide(&result, depth);
                } else {
                    perft::run_perft_suite(&board, side, depth);
                }
            }
            GameSubcommand::Clear => utils::clear_screen()?,
            GameSubcommand::Restart => {
                board = start_board;
                side = start_side;
                record.clear();
                search.clear();
                finished = game_outcome(&board, side).is_some();
                println!("{board}");
            }
            GameSubcommand::Quit => break,
        }
    }
    Ok(())
}

/// Result message when `side` has no legal moves, `None` while the game goes on.
fn game_outcome(board: &Board, side: Side) -> Option<String> {
    let (moves, pins) = legal_moves(board, side);
    if !moves.is_empty() {
        return None;
    }
    Some(if pins.in_check() {
        format!("Checkmate, {} wins", !side)
    } else {
        "Stalemate".to_string()
    })
}
