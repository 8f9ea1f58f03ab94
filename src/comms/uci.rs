use std::{
    io::BufRead,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self},
    time::Duration,
};

use crate::{
    comms::uci_parser::{GoParams, UciCommand, parse_line},
    config::EngineConfig,
    prelude::*,
};

/// Safety buffer subtracted from every time allocation, in ms
const MOVE_OVERHEAD: u64 = 50;

#[derive(Debug)]
pub struct UciState {
    board: Board,
    side: Side,
    default_depth: u8,
    search: Arc<Mutex<Search>>,
    /// Raised to make the running search return after its current depth
    stop: Arc<AtomicBool>,
    search_thread: Option<thread::JoinHandle<()>>,
    /// Keys of the positions before the current one, oldest first
    history: Vec<u64>,
}

impl Drop for UciState {
    fn drop(&mut self) {
        cmd_stop(self);
    }
}

impl UciState {
    pub fn new(config: &EngineConfig, depth: Option<u8>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let mut config = config.clone();
        config.search.emit_info = true;
        let search = Search::from_config(&config).with_stop_flag(stop.clone());
        Self {
            board: Board::new(),
            side: Side::White,
            default_depth: depth.unwrap_or(64),
            search: Arc::new(Mutex::new(search)),
            stop,
            search_thread: None,
            history: Vec::new(),
        }
    }

    fn reset(&mut self) -> miette::Result<()> {
        trace!("Resetting UciState");
        self.board = Board::new();
        self.side = Side::White;
        self.history.clear();
        self.lock_search()?.clear();
        Ok(())
    }

    fn lock_search(&self) -> miette::Result<std::sync::MutexGuard<'_, Search>> {
        self.search
            .lock()
            .map_err(|_| miette::miette!("Search state poisoned by a panicked search"))
    }
}

pub fn play(config: &EngineConfig) -> miette::Result<()> {
    let mut state = UciState::new(config, None);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(Ok(line)) = lines.next() {
        match parse_line(&line) {
            UciCommand::Uci => cmd_uci(),
            UciCommand::IsReady => cmd_isready(),
            UciCommand::UciNewGame => {
                cmd_stop(&mut state);
                state.reset()?;
            }
            UciCommand::Position {
                startpos,
                fen,
                moves,
            } => {
                cmd_stop(&mut state);
                if let Err(e) = cmd_position(&mut state, startpos, fen, moves) {
                    warn!("Error processing position command: {:?}", e);
                }
            }
            UciCommand::Go(go_params) => {
                cmd_stop(&mut state);
                cmd_go(&mut state, go_params);
            }
            UciCommand::Stop => cmd_stop(&mut state),
            UciCommand::Quit => break,
            UciCommand::Unknown(cmd) => {
                if !cmd.trim().is_empty() {
                    info!("Received unknown command: {cmd}");
                }
            }
            UciCommand::SetOption { name, value } => {
                if let Err(e) = cmd_setoption(&name, &value) {
                    warn!("Error setting option: {e:?}");
                }
            }
        }
    }

    cmd_stop(&mut state);

    Ok(())
}

/// Sets up the position, recording the key of every position the moves pass
/// through so the search can see repetitions of the game record.
fn cmd_position(
    state: &mut UciState,
    startpos: bool,
    fen: Option<String>,
    moves: Vec<String>,
) -> miette::Result<()> {
    let (mut board, mut side) = match (startpos, fen) {
        (true, _) => (Board::new(), Side::White),
        (false, Some(fen)) => parse_position(&fen)?,
        (false, None) => miette::bail!("position needs 'startpos' or 'fen'"),
    };

    let search = state.lock_search()?;
    let mut history = Vec::with_capacity(moves.len());
    for text in &moves {
        let mv = parse_user_move(&board, side, text)
            .with_context(|| format!("Applying move list at '{text}'"))?;
        history.push(search.hash(&board, side));
        board = board.fork(side, mv);
        side = !side;
    }
    drop(search);

    state.board = board;
    state.side = side;
    state.history = history;
    debug!("Position set to '{}'", state.board.to_fen(state.side));
    Ok(())
}

/// Turns the clock fields of `go` into search limits.
fn limits_for(params: &GoParams, side: Side, default_depth: u8) -> SearchLimits {
    let mut limits = SearchLimits {
        max_depth: Some(params.depth.unwrap_or(default_depth)),
        max_time: None,
        max_nodes: params.nodes,
    };
    if params.infinite {
        limits.max_depth = params.depth;
        return limits;
    }

    if let Some(ms) = params.move_time {
        limits.max_time = Some(Duration::from_millis(ms.saturating_sub(MOVE_OVERHEAD).max(1)));
        return limits;
    }

    let (time_remaining, increment) = match side {
        Side::White => (params.wtime, params.winc.unwrap_or(0)),
        Side::Black => (params.btime, params.binc.unwrap_or(0)),
    };

    if let Some(time) = time_remaining {
        let allocation = if let Some(moves_to_go) = params.moves_to_go {
            let divisor = (moves_to_go + 2).clamp(1, 50);
            (time / divisor).saturating_sub(MOVE_OVERHEAD)
        } else {
            // Sudden death
            let target = (time / 20) + (increment / 2);
            let safety_max = (time * 8) / 10;
            target.min(safety_max).saturating_sub(MOVE_OVERHEAD)
        };
        let allocation = allocation.max(10);
        info!("Time Management: Remaining={time}ms, Inc={increment}ms, Allocating={allocation}ms");
        limits.max_time = Some(Duration::from_millis(allocation));
    }
    limits
}

fn cmd_go(state: &mut UciState, params: GoParams) {
    let board = state.board;
    let side = state.side;
    let history = state.history.clone();
    let search = state.search.clone();
    let limits = limits_for(&params, side, state.default_depth);

    state.stop.store(false, Ordering::Release);
    debug!("Spawning search thread with {limits:?}");
    state.search_thread = Some(thread::spawn(move || {
        let result = match search.lock() {
            Ok(mut search) => {
                search.set_limits(limits);
                search.set_history(&history);
                search.find_best_move(&board, side)
            }
            Err(_) => {
                error!("Search state poisoned, no move searched");
                SearchResult::default()
            }
        };

        match result.best_move {
            Some(best_move) => println!("bestmove {}", best_move.uci()),
            None => println!("bestmove 0000"),
        }
    }));
}

fn cmd_stop(state: &mut UciState) {
    state.stop.store(true, Ordering::Release);
    if let Some(handle) = state.search_thread.take() {
        if handle.join().is_err() {
            error!("Search thread panicked");
        }
    }
}

fn cmd_setoption(name: &str, value: &str) -> miette::Result<()> {
    match name {
        "LogFile" => {
            let enable = value.eq_ignore_ascii_case("true");
            toggle_file_logging(enable)?;
            info!("Set file logging to {enable}");
        }
        _ => {
            info!("Unknown option: {name} = {value}");
        }
    }
    Ok(())
}

fn cmd_isready() {
    println!("readyok");
}

fn cmd_uci() {
    println!("id name {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("id author {}", env!("CARGO_PKG_AUTHORS"));
    println!();
    println!("option name LogFile type check default false");
    println!("uciok");
}
