use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::prelude::*;
use std::time::Duration;

/// Counters collected while searching. Only filled when
/// [`SearchConfig::collect_stats`] is set.
#[derive(Debug, Clone)]
pub struct SearchStats {
    pub nodes_searched: u64, // Total nodes including qsearch
    pub depth_reached: u8,
    pub time_elapsed: Duration,
    pub nps: u64,
    pub hash_full: u16, // per-mille

    pub main_search_nodes: u64, // Nodes that generated and searched moves
    pub qsearch_nodes: u64,

    pub repetition_returns: u64,
    pub mate_returns: u64, // Checkmate or stalemate leaves
    pub standpat_returns: u64,

    pub tt_probes: u64,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,

    pub asp_fail_high: u64,
    pub asp_fail_low: u64,
    pub asp_research: u64,

    pub beta_cutoffs_main: u64,
    pub beta_cutoffs_qs: u64,

    /// How many moves into the list a beta cutoff happened
    pub cutoff_at_move: [u64; MAX_PLY],
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            nodes_searched: 0,
            depth_reached: 0,
            time_elapsed: Duration::ZERO,
            nps: 0,
            hash_full: 0,
            main_search_nodes: 0,
            qsearch_nodes: 0,
            repetition_returns: 0,
            mate_returns: 0,
            standpat_returns: 0,
            tt_probes: 0,
            tt_hits: 0,
            tt_cutoffs: 0,
            asp_fail_high: 0,
            asp_fail_low: 0,
            asp_research: 0,
            beta_cutoffs_main: 0,
            beta_cutoffs_qs: 0,
            cutoff_at_move: [0; MAX_PLY],
        }
    }
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn percent(numerator: u64, denominator: u64) -> f64 {
        if denominator == 0 {
            0.0
        } else {
            100.0 * numerator as f64 / denominator as f64
        }
    }

    pub fn calculate_nps(&mut self) {
        let time_ms = self.time_elapsed.as_millis().max(1) as u64;
        self.nps = (self.nodes_searched * 1000) / time_ms;
    }

    pub fn avg_cutoff_index(&self) -> f64 {
        let total_cutoffs: u64 = self.cutoff_at_move.iter().sum();
        if total_cutoffs == 0 {
            0.0
        } else {
            let weighted_sum: u64 = self
                .cutoff_at_move
                .iter()
                .enumerate()
                .map(|(i, &count)| i as u64 * count)
                .sum();
            weighted_sum as f64 / total_cutoffs as f64
        }
    }

    pub fn log_summary(&self) {
        let _span = debug_span!("search_stats").entered();
        debug!("=> SEARCH STATISTICS (depth {})", self.depth_reached);
        debug!(
            "NODES total={} time={:?} nps={}",
            self.nodes_searched, self.time_elapsed, self.nps
        );

        debug!("");
        debug!("==> Main Search ({} nodes)", self.main_search_nodes);
        debug!(
            "  - Beta Cutoffs:     {:>9} ({:>6.2}%)",
            self.beta_cutoffs_main,
            Self::percent(self.beta_cutoffs_main, self.main_search_nodes)
        );
        debug!("  - Repetitions:      {:>9}", self.repetition_returns);
        debug!("  - Mate/Stalemate:   {:>9}", self.mate_returns);

        debug!("");
        debug!("==> QSearch ({} nodes)", self.qsearch_nodes);
        debug!(
            "  - Beta Cutoffs:     {:>9} ({:>6.2}%)",
            self.beta_cutoffs_qs,
            Self::percent(self.beta_cutoffs_qs, self.qsearch_nodes)
        );
        debug!("  - Stand Pat:        {:>9}", self.standpat_returns);

        debug!("");
        debug!("==> TT");
        debug!(
            "  - TT Hits:          {:>9} ({:>6.2}% of probes), hash_full: {}/1000",
            self.tt_hits,
            Self::percent(self.tt_hits, self.tt_probes),
            self.hash_full
        );
        debug!(
            "    - TT Cutoffs:     {:>9} ({:>6.2}% of hits)",
            self.tt_cutoffs,
            Self::percent(self.tt_cutoffs, self.tt_hits)
        );
        if self.asp_research > 0 {
            debug!(
                "  - ASP Researches:   {:>9} (high: {}, low: {})",
                self.asp_research, self.asp_fail_high, self.asp_fail_low
            );
        }

        let total_cutoffs: u64 = self.cutoff_at_move.iter().sum();
        if total_cutoffs > 0 {
            debug!("");
            debug!("==> Move Ordering");
            debug!("  - Total Beta Cutoffs: {}", total_cutoffs);
            debug!("  - Avg. Cutoff Index:  {:.2}", self.avg_cutoff_index());

            let histogram: Vec<String> = self
                .cutoff_at_move
                .iter()
                .take(10)
                .enumerate()
                .filter(|&(_, &count)| count > 0)
                .map(|(i, count)| format!("{i}:{count}"))
                .collect();

            if !histogram.is_empty() {
                debug!(
                    "  - Cutoff Histogram (move index:count): [{}]",
                    histogram.join(", ")
                );
            }
        }
    }
}

/// Configuration for search behavior, the `[search]` config table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub hash_size_mb: usize,
    /// Half-width of the first aspiration window. 0 searches every depth with a full window.
    pub aspiration_window: i32,
    /// Factor the window grows by after a fail high or fail low
    pub aspiration_growth: i32,
    /// Re-searches allowed before falling back to a full window
    pub aspiration_retries: u8,
    /// Fixed seed for reproducible hash keys
    pub zobrist_seed: Option<u64>,
    pub check_extension: bool,
    pub enable_tt: bool,
    /// Print `info` lines after every completed depth
    pub emit_info: bool,
    pub collect_stats: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hash_size_mb: 16,
            aspiration_window: 50,
            aspiration_growth: 4,
            aspiration_retries: 3,
            zobrist_seed: None,
            check_extension: true,
            enable_tt: true,
            emit_info: false,
            collect_stats: true,
        }
    }
}

/// Search limits (time, depth, nodes). Checked between iterative deepening depths.
#[derive(Default, Debug, Clone, Copy)]
pub struct SearchLimits {
    pub max_depth: Option<u8>,
    pub max_time: Option<Duration>,
    pub max_nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn time(time_ms: u64) -> Self {
        Self {
            max_time: Some(Duration::from_millis(time_ms)),
            ..Default::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            max_nodes: Some(nodes),
            ..Default::default()
        }
    }

    pub fn infinite() -> Self {
        Self::default()
    }
}

/// Result of a search
#[derive(Debug, Default, Clone)]
pub struct SearchResult {
    /// `None` only when the root has no legal moves
    pub best_move: Option<Move>,
    /// From the point of view of the side to move at the root
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub time: Duration,
    /// Principal variation, root move first
    pub pv: Vec<Move>,
}

impl SearchResult {
    pub fn nps(&self) -> u64 {
        let time_ms = self.time.as_millis().max(1) as u64;
        (self.nodes * 1000) / time_ms
    }

    /// Principal variation ordered from the deepest move back to the root move.
    pub fn pv_deepest_first(&self) -> Vec<Move> {
        self.pv.iter().rev().copied().collect()
    }

    pub fn is_mate(&self) -> bool {
        is_mate_score(self.score)
    }

    /// Full moves until mate, negative when the side to move is getting mated.
    pub fn mate_in(&self) -> Option<i32> {
        mate_distance(self.score)
    }

    /// `cp 35` or `mate -2`, as UCI expects after `score`
    pub fn uci_score(&self) -> String {
        match self.mate_in() {
            Some(moves) => format!("mate {moves}"),
            None => format!("cp {}", self.score),
        }
    }
}

#[inline(always)]
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() > MATE_THRESHOLD
}

/// Converts a mate score into full moves, see [`SearchResult::mate_in`].
pub const fn mate_distance(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    if score > 0 {
        Some((MATE_SCORE - score + 1) / 2)
    } else {
        Some(-(MATE_SCORE + score) / 2)
    }
}

/// Adjusts Score to encode mate distance in the score
/// Takes ply-independent score and converts it to also hold ply info
#[inline(always)]
pub fn adjust_score_for_ply(score: i32, ply: usize) -> i32 {
    if score.abs() > MATE_THRESHOLD {
        if score > 0 {
            score.saturating_sub(ply as i32)
        } else {
            score.saturating_add(ply as i32)
        }
    } else {
        score
    }
}

/// Adjusts Score to be relative to root.
/// To be called before entry is stored in TranspositionTable
/// Takes ply-dependent score and converts it to 'absolute' score
#[inline(always)]
pub fn adjust_score_from_ply(score: i32, ply: usize) -> i32 {
    if score.abs() > MATE_THRESHOLD {
        if score > 0 {
            score.saturating_add(ply as i32)
        } else {
            score.saturating_sub(ply as i32)
        }
    } else {
        score
    }
}
