//! Negamax search with alpha-beta pruning and iterative deepening.
//! Techniques used:
//! - Principal Variation Search
//! - Aspiration Windows
//! - Check Extension
//! - Quiescence Search with stand pat
//! - Transposition Table, killer moves and MVV-LVA ordering

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::trace_span;

use crate::config::EngineConfig;
use crate::moves::move_gen::{AllMoves, CapturesOnly, generate};
use crate::prelude::*;
use crate::search::move_ordering::{
    KillerTable, MainSearchPolicy, OrderingContext, OrderingWeights, QSearchPolicy,
};
use crate::search::move_picker::MovePicker;
use crate::search::repetition::RepetitionTable;
use crate::search::tt::TranspositionTable;
use crate::search::common::is_mate_score;
use crate::search::{SearchConfig, SearchLimits, SearchResult, SearchStats};

/// Struct that holds relatively large per-ply tables
#[derive(Debug)]
struct SearchTables {
    killers: KillerTable,
    /// Triangular principal variation table: row `ply` holds the best line from `ply`
    pv: [[Move; MAX_PLY]; MAX_PLY],
    pv_len: [usize; MAX_PLY],
}

impl Default for SearchTables {
    fn default() -> Self {
        Self {
            killers: KillerTable::default(),
            pv: [[Move::NULL; MAX_PLY]; MAX_PLY],
            pv_len: [0; MAX_PLY],
        }
    }
}

impl SearchTables {
    fn clear(&mut self) {
        self.killers.clear();
        self.pv_len = [0; MAX_PLY];
    }

    /// Makes `mv` followed by the child's line the best line at `ply`.
    fn update_pv(&mut self, ply: usize, mv: Move) {
        self.pv[ply][ply] = mv;
        let child_len = self.pv_len[ply + 1].max(ply + 1);
        for i in (ply + 1)..child_len {
            self.pv[ply][i] = self.pv[ply + 1][i];
        }
        self.pv_len[ply] = child_len;
    }

    fn root_line(&self) -> Vec<Move> {
        self.pv[0][..self.pv_len[0]].to_vec()
    }
}

/// Single-threaded search instance. Owns its hash keys, transposition table,
/// repetition stack, killer and PV tables.
#[derive(Debug)]
pub struct Search {
    config: SearchConfig,
    limits: SearchLimits,
    evaluator: Box<dyn Evaluator>,
    /// Piece-square tables used for ordering
    eval_params: EvalParams,
    ordering: OrderingWeights,
    zobrist: ZobristKeys,
    tt: TranspositionTable,
    repetition: RepetitionTable,
    /// Keys of positions played before the root, oldest first
    history: Vec<u64>,
    tables: Box<SearchTables>,
    stop: Option<Arc<AtomicBool>>,
    root_hint: Option<Move>,
    nodes: u64,
    start_time: Instant,
    stats: SearchStats,
}

impl Default for Search {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        let eval_params = EvalParams::default();
        Self {
            config,
            limits: SearchLimits::default(),
            evaluator: Box::new(StandardEvaluator::new(eval_params.clone())),
            eval_params,
            ordering: OrderingWeights::default(),
            zobrist: ZobristKeys::new(config.zobrist_seed),
            tt: TranspositionTable::new(config.hash_size_mb),
            repetition: RepetitionTable::new(),
            history: Vec::new(),
            tables: Box::default(),
            stop: None,
            root_hint: None,
            nodes: 0,
            start_time: Instant::now(),
            stats: SearchStats::new(),
        }
    }

    /// Search set up from every table of an [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut search = Self::new(config.search);
        search.evaluator = Box::new(StandardEvaluator::new(config.eval.clone()));
        search.eval_params = config.eval.clone();
        search.ordering = config.ordering.clone();
        search
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Constructor to set limits for search. Time, node count, depth
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn set_limits(&mut self, limits: SearchLimits) {
        self.limits = limits;
    }

    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.stop = Some(stop);
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        &*self.evaluator
    }

    /// Position key under this search's hash keys.
    pub fn hash(&self, board: &Board, side: Side) -> u64 {
        self.zobrist.hash(board, side)
    }

    /// Keys of the positions played before the next root, oldest first.
    /// The root position itself must not be included.
    pub fn set_history(&mut self, keys: &[u64]) {
        self.history.clear();
        self.history.extend_from_slice(keys);
    }

    /// Forgets everything learned so far, for a new game.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.tables.clear();
        self.history.clear();
        self.repetition.clear();
        self.root_hint = None;
        self.stats = SearchStats::new();
    }

    /// Iterative deepening up to `max_depth`, ignoring other limits.
    pub fn search(&mut self, board: &Board, side: Side, max_depth: u8) -> SearchResult {
        let limits = self.limits;
        self.limits = SearchLimits::depth(max_depth);
        let result = self.find_best_move(board, side);
        self.limits = limits;
        result
    }

    /// Iterative deepening under the current [`SearchLimits`]. Returns the result
    /// of the last completed depth.
    pub fn find_best_move(&mut self, board: &Board, side: Side) -> SearchResult {
        let span = trace_span!("search_root");
        let _guard = span.enter();

        self.prepare_for_search();
        debug!(
            "Finding best move for '{}' with max_depth: {:?}, max_time: {:?}",
            board.to_fen(side),
            self.limits.max_depth,
            self.limits.max_time
        );

        let (root_moves, pins) = legal_moves(board, side);
        if root_moves.is_empty() {
            debug!("No legal moves");
            return SearchResult {
                best_move: None,
                score: if pins.in_check() { -MATE_SCORE } else { 0 },
                depth: 0,
                nodes: 0,
                time: self.start_time.elapsed(),
                pv: Vec::new(),
            };
        }

        let max_depth = depth_bound(self.limits.max_depth);

        let mut result = SearchResult {
            best_move: root_moves.iter().next().copied(),
            ..Default::default()
        };
        let mut prev_score = 0;

        for depth in 1..=max_depth {
            if depth > 1 && self.should_stop() {
                break;
            }

            let score = self.aspiration(board, side, depth, prev_score);
            let pv = self.tables.root_line();

            result = SearchResult {
                best_move: pv.first().copied().or(result.best_move),
                score,
                depth,
                nodes: self.nodes,
                time: self.start_time.elapsed(),
                pv,
            };
            self.root_hint = result.best_move;
            prev_score = score;

            debug!(
                "Depth {depth} done: score {} best {:?} nodes {}",
                score,
                result.best_move.map(|m| m.uci()),
                self.nodes
            );
            if self.config.emit_info {
                self.emit_info_string(&result);
            }

            // A mate inside the searched horizon cannot improve with depth
            if result
                .mate_in()
                .is_some_and(|moves| moves.unsigned_abs() * 2 <= depth as u32)
            {
                break;
            }
        }

        if self.config.collect_stats {
            self.stats.depth_reached = result.depth;
            self.stats.nodes_searched = self.nodes;
            self.stats.time_elapsed = self.start_time.elapsed();
            self.stats.hash_full = self.tt.hash_full();
            self.stats.calculate_nps();
            self.stats.log_summary();
        }
        result
    }

    /// Searches `depth` with a window centred on `prev_score`, widening it after
    /// every fail until the score lands strictly inside.
    fn aspiration(&mut self, board: &Board, side: Side, depth: u8, prev_score: i32) -> i32 {
        let max_depth = depth as usize;
        if depth == 1 || self.config.aspiration_window <= 0 || is_mate_score(prev_score) {
            return self.negamax(board, side, 0, max_depth, -INFINITY, INFINITY);
        }

        let mut window = self.config.aspiration_window;
        let mut retries = 0;
        loop {
            let (alpha, beta) = if retries >= self.config.aspiration_retries {
                (-INFINITY, INFINITY)
            } else {
                (
                    prev_score.saturating_sub(window).max(-INFINITY),
                    prev_score.saturating_add(window).min(INFINITY),
                )
            };
            trace!("Aspiration window at depth {depth}: ({alpha}, {beta})");

            let score = self.negamax(board, side, 0, max_depth, alpha, beta);
            if (score > alpha && score < beta) || (alpha == -INFINITY && beta == INFINITY) {
                return score;
            }

            if self.config.collect_stats {
                self.stats.asp_research += 1;
                if score <= alpha {
                    self.stats.asp_fail_low += 1;
                } else {
                    self.stats.asp_fail_high += 1;
                }
            }
            trace!("Aspiration fail at depth {depth}: score {score} outside ({alpha}, {beta})");
            retries += 1;
            window = window.saturating_mul(self.config.aspiration_growth.max(2));
        }
    }

    /// Fail-soft negamax. `max_depth` is the ply at which quiescence takes over.
    fn negamax(
        &mut self,
        board: &Board,
        side: Side,
        ply: usize,
        max_depth: usize,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        debug_assert!(alpha < beta, "Invalid window: alpha {alpha}, beta {beta}");
        self.nodes += 1;
        self.tables.pv_len[ply] = ply;

        let key = self.zobrist.hash(board, side);
        if ply > 0 && self.repetition.check(key) {
            if self.config.collect_stats {
                self.stats.repetition_returns += 1;
            }
            return 0;
        }

        // Bounded recursion, treat as leaf
        if ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(board, side);
        }

        let depth_remaining = max_depth.saturating_sub(ply).min(u8::MAX as usize) as u8;
        let mut hint = if ply == 0 { self.root_hint } else { None };

        if self.config.enable_tt {
            if self.config.collect_stats {
                self.stats.tt_probes += 1;
            }
            let (entry, usable) = self.tt.lookup(key, alpha, beta, depth_remaining, ply);
            if let Some(entry) = entry {
                if self.config.collect_stats {
                    self.stats.tt_hits += 1;
                }
                hint = hint.or(entry.best_move);
                // Root always searches so it has a move and a PV to report
                if usable && ply > 0 {
                    if self.config.collect_stats {
                        self.stats.tt_cutoffs += 1;
                    }
                    return entry.score;
                }
            }
        }

        if ply >= max_depth {
            return self.quiescence(board, side, ply, alpha, beta);
        }

        let pins = PinData::reload(board, side);
        let mut moves = MoveBuffer::new();
        generate::<AllMoves, _>(board, side, &pins, &mut moves);

        if moves.is_empty() {
            if self.config.collect_stats {
                self.stats.mate_returns += 1;
            }
            return if pins.in_check() {
                -(MATE_SCORE - ply as i32)
            } else {
                0
            };
        }

        if self.config.collect_stats {
            self.stats.main_search_nodes += 1;
        }

        let child_max_depth = if self.config.check_extension && pins.in_check() {
            max_depth + 1
        } else {
            max_depth
        };

        let ctx = OrderingContext {
            board,
            side,
            pins: &pins,
            weights: &self.ordering,
            params: &self.eval_params,
            killers: self.tables.killers.get(ply),
            hint,
        };
        let mut picker = MovePicker::new::<MainSearchPolicy>(&ctx, moves.as_mut_slice());

        self.repetition.push(key);
        let original_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        let mut move_index = 0;
        while let Some(mv) = picker.next_best() {
            let child = board.fork(side, mv);

            let score = if move_index == 0 {
                -self.negamax(&child, !side, ply + 1, child_max_depth, -beta, -alpha)
            } else {
                // Null window probe, re-searched only if it might beat alpha
                let probe =
                    -self.negamax(&child, !side, ply + 1, child_max_depth, -alpha - 1, -alpha);
                if probe > alpha && probe < beta {
                    -self.negamax(&child, !side, ply + 1, child_max_depth, -beta, -alpha)
                } else {
                    probe
                }
            };

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }

            if score > alpha {
                alpha = score;
                self.tables.update_pv(ply, mv);
            }

            if alpha >= beta {
                if self.config.collect_stats {
                    if move_index < MAX_PLY {
                        self.stats.cutoff_at_move[move_index] += 1;
                    }
                    self.stats.beta_cutoffs_main += 1;
                }
                if mv.is_quiet() {
                    self.tables.killers.insert(ply, mv);
                }
                break;
            }
            move_index += 1;
        }

        self.repetition.pop();

        if self.config.enable_tt {
            self.tt.insert(
                key,
                best_score,
                best_move,
                depth_remaining,
                original_alpha,
                beta,
                ply,
            );
        }

        best_score
    }

    /// Captures only, or every move while in check. Stand pat bounds the
    /// score from below when not in check.
    fn quiescence(
        &mut self,
        board: &Board,
        side: Side,
        ply: usize,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        if self.config.collect_stats {
            self.stats.qsearch_nodes += 1;
        }
        if ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(board, side);
        }

        let pins = PinData::reload(board, side);
        let in_check = pins.in_check();
        let mut best_score = -INFINITY;

        if !in_check {
            let stand_pat = self.evaluator.evaluate(board, side);
            if stand_pat >= beta {
                if self.config.collect_stats {
                    self.stats.standpat_returns += 1;
                }
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            best_score = stand_pat;
        }

        let mut moves = MoveBuffer::new();
        if in_check {
            generate::<AllMoves, _>(board, side, &pins, &mut moves);
            if moves.is_empty() {
                if self.config.collect_stats {
                    self.stats.mate_returns += 1;
                }
                return -(MATE_SCORE - ply as i32);
            }
        } else {
            generate::<CapturesOnly, _>(board, side, &pins, &mut moves);
        }

        let ctx = OrderingContext {
            board,
            side,
            pins: &pins,
            weights: &self.ordering,
            params: &self.eval_params,
            killers: [None; 2],
            hint: None,
        };
        let mut picker = MovePicker::new::<QSearchPolicy>(&ctx, moves.as_mut_slice());

        while let Some(mv) = picker.next_best() {
            self.nodes += 1;
            let child = board.fork(side, mv);
            let score = -self.quiescence(&child, !side, ply + 1, -beta, -alpha);

            best_score = best_score.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                if self.config.collect_stats {
                    self.stats.beta_cutoffs_qs += 1;
                }
                break;
            }
        }
        best_score
    }
}

impl Search {
    /// Limits are only consulted between depths, so a depth in progress always completes.
    fn should_stop(&self) -> bool {
        if self
            .stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
        {
            debug!("Stop signal recieved");
            return true;
        }

        if let Some(max_time) = self.limits.max_time {
            // The next depth usually costs more than everything before it
            if self.start_time.elapsed() * 2 >= max_time {
                debug!("Time budget would be exceeded by another depth");
                return true;
            }
        }

        if self.limits.max_nodes.is_some_and(|l| self.nodes >= l) {
            debug!("Node limit exhausted");
            return true;
        }

        false
    }

    fn emit_info_string(&self, result: &SearchResult) {
        let pv: Vec<String> = result.pv.iter().map(|m| m.uci()).collect();
        let msg = format!(
            "info depth {} score {} nodes {} nps {} time {} pv {}",
            result.depth,
            result.uci_score(),
            result.nodes,
            result.nps(),
            result.time.as_millis(),
            pv.join(" ")
        );
        println!("{msg}");
        debug!("{msg}");
    }

    fn prepare_for_search(&mut self) {
        self.nodes = 0;
        self.start_time = Instant::now();
        self.tables.clear();
        self.root_hint = None;
        self.repetition.load(&self.history);
        self.stats = SearchStats::new();
    }

    /// Time spent in the last search
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Deepest iteration the search will start, leaving room for check extensions
pub(crate) const MAX_SEARCH_DEPTH: u8 = (MAX_PLY / 2) as u8;

/// Iteration cap for a requested depth. Unlimited searches run to
/// [`MAX_SEARCH_DEPTH`]; larger requests are cut down to it with a warning.
pub(crate) fn depth_bound(requested: Option<u8>) -> u8 {
    match requested {
        None => MAX_SEARCH_DEPTH,
        Some(depth) if depth > MAX_SEARCH_DEPTH => {
            warn!("Requested depth {depth} exceeds the limit, searching to depth {MAX_SEARCH_DEPTH}");
            MAX_SEARCH_DEPTH
        }
        Some(depth) => depth.max(1),
    }
}
