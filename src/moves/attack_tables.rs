//! Precomputed attack tables.
//!
//! Leaper masks and rays are plain per-square arrays. Rook and bishop attacks
//! are stored for every subset of each square's relevant occupancy mask (edge
//! squares excluded, since they never block anything further) in one shared
//! vector; [`BitBoard::pext`] maps a live occupancy onto the dense index.

use std::sync::LazyLock;

use crate::prelude::*;

pub static ATTACK_TABLES: LazyLock<AttackTables> = LazyLock::new(AttackTables::new);

const ORTHOGONAL: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

const DIAGONAL: [Direction; 4] = [
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

#[derive(Debug)]
struct SliderTable {
    masks: [BitBoard; NUM_SQUARES],
    offsets: [usize; NUM_SQUARES],
}

#[derive(Debug)]
pub struct AttackTables {
    knight: [BitBoard; NUM_SQUARES],
    king: [BitBoard; NUM_SQUARES],
    /// Squares a pawn of the given side attacks from each square
    pawn_attacks: [[BitBoard; NUM_SQUARES]; NUM_SIDES],
    /// Empty-board ray from each square to the edge, per direction
    rays: [[BitBoard; NUM_SQUARES]; 8],
    /// `segments[a * 64 + b]`: squares after `a` up to and including `b`, when aligned
    segments: Box<[BitBoard]>,
    rook: SliderTable,
    bishop: SliderTable,
    slider_attacks: Box<[BitBoard]>,
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackTables {
    pub fn new() -> Self {
        let mut rays = [[BitBoard::EMPTY; NUM_SQUARES]; 8];
        for dir in Direction::ALL {
            for sq in 0..NUM_SQUARES {
                rays[dir.index()][sq] = ray_attacks(sq, BitBoard::EMPTY, &[dir]);
            }
        }

        let mut segments = vec![BitBoard::EMPTY; NUM_SQUARES * NUM_SQUARES];
        for from in 0..NUM_SQUARES {
            for dir in Direction::ALL {
                let mut walked = BitBoard::EMPTY;
                let (dr, df) = dir.deltas();
                let (mut rank, mut file) = ((from / 8) as i8, (from % 8) as i8);
                loop {
                    rank += dr;
                    file += df;
                    if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                        break;
                    }
                    let to = (rank * 8 + file) as usize;
                    walked.set(to);
                    segments[from * NUM_SQUARES + to] = walked;
                }
            }
        }

        let mut slider_attacks = Vec::with_capacity(107_648);
        let rook = build_slider_table(&ORTHOGONAL, &mut slider_attacks);
        let bishop = build_slider_table(&DIAGONAL, &mut slider_attacks);
        debug!(
            "Built slider attack tables with {} entries",
            slider_attacks.len()
        );

        Self {
            knight: leaper_table(&[(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)]),
            king: leaper_table(&[(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)]),
            pawn_attacks: [
                leaper_table(&[(1, -1), (1, 1)]),
                leaper_table(&[(-1, -1), (-1, 1)]),
            ],
            rays,
            segments: segments.into_boxed_slice(),
            rook,
            bishop,
            slider_attacks: slider_attacks.into_boxed_slice(),
        }
    }

    #[inline(always)]
    pub fn knight(&self, sq: Square) -> BitBoard {
        self.knight[sq.index()]
    }

    #[inline(always)]
    pub fn king(&self, sq: Square) -> BitBoard {
        self.king[sq.index()]
    }

    #[inline(always)]
    pub fn pawn_attacks(&self, sq: Square, side: Side) -> BitBoard {
        self.pawn_attacks[side.index()][sq.index()]
    }

    #[inline(always)]
    pub fn ray(&self, sq: Square, dir: Direction) -> BitBoard {
        self.rays[dir.index()][sq.index()]
    }

    /// Squares strictly between `from` and `to`, plus `to` itself. Empty when
    /// the two squares share no rank, file or diagonal.
    #[inline(always)]
    pub fn segment(&self, from: Square, to: Square) -> BitBoard {
        self.segments[from.index() * NUM_SQUARES + to.index()]
    }

    #[inline(always)]
    pub fn rook_attacks(&self, sq: Square, occupied: BitBoard) -> BitBoard {
        let i = sq.index();
        self.slider_attacks[self.rook.offsets[i] + occupied.pext(self.rook.masks[i]) as usize]
    }

    #[inline(always)]
    pub fn bishop_attacks(&self, sq: Square, occupied: BitBoard) -> BitBoard {
        let i = sq.index();
        self.slider_attacks[self.bishop.offsets[i] + occupied.pext(self.bishop.masks[i]) as usize]
    }

    #[inline(always)]
    pub fn queen_attacks(&self, sq: Square, occupied: BitBoard) -> BitBoard {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }

    /// Attack set of a non-pawn piece.
    #[inline(always)]
    pub fn piece_attacks(&self, piece: Piece, sq: Square, occupied: BitBoard) -> BitBoard {
        match piece {
            Piece::Knight => self.knight(sq),
            Piece::Bishop => self.bishop_attacks(sq, occupied),
            Piece::Rook => self.rook_attacks(sq, occupied),
            Piece::Queen => self.queen_attacks(sq, occupied),
            Piece::King => self.king(sq),
            Piece::Pawn => unreachable!("pawn attacks depend on side"),
        }
    }
}

fn leaper_table(offsets: &[(i8, i8)]) -> [BitBoard; NUM_SQUARES] {
    let mut table = [BitBoard::EMPTY; NUM_SQUARES];
    for (sq, entry) in table.iter_mut().enumerate() {
        let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);
        for &(dr, df) in offsets {
            let (r, f) = (rank + dr, file + df);
            if (0..8).contains(&r) && (0..8).contains(&f) {
                entry.set((r * 8 + f) as usize);
            }
        }
    }
    table
}

/// Slow reference walk: attacks from `sq` along `dirs`, stopping at (and including) blockers.
fn ray_attacks(sq: usize, occupied: BitBoard, dirs: &[Direction]) -> BitBoard {
    let mut attacks = BitBoard::EMPTY;
    for dir in dirs {
        let (dr, df) = dir.deltas();
        let (mut rank, mut file) = ((sq / 8) as i8, (sq % 8) as i8);
        loop {
            rank += dr;
            file += df;
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                break;
            }
            let idx = (rank * 8 + file) as usize;
            attacks.set(idx);
            if occupied.contains_square(idx) {
                break;
            }
        }
    }
    attacks
}

/// Ray squares that can block, i.e. everything except the final edge square.
fn relevant_mask(sq: usize, dirs: &[Direction]) -> BitBoard {
    let mut mask = BitBoard::EMPTY;
    for dir in dirs {
        let (dr, df) = dir.deltas();
        let (mut rank, mut file) = ((sq / 8) as i8 + dr, (sq % 8) as i8 + df);
        while (0..8).contains(&(rank + dr)) && (0..8).contains(&(file + df)) {
            mask.set((rank * 8 + file) as usize);
            rank += dr;
            file += df;
        }
    }
    mask
}

fn build_slider_table(dirs: &[Direction], attacks: &mut Vec<BitBoard>) -> SliderTable {
    let mut table = SliderTable {
        masks: [BitBoard::EMPTY; NUM_SQUARES],
        offsets: [0; NUM_SQUARES],
    };

    for sq in 0..NUM_SQUARES {
        let mask = relevant_mask(sq, dirs);
        let offset = attacks.len();
        table.masks[sq] = mask;
        table.offsets[sq] = offset;
        attacks.resize(offset + (1 << mask.pop_count()), BitBoard::EMPTY);

        // carry-rippler over every subset of the mask
        let mut subset = 0u64;
        loop {
            let occupied = BitBoard(subset);
            attacks[offset + occupied.pext(mask) as usize] = ray_attacks(sq, occupied, dirs);
            subset = subset.wrapping_sub(mask.0) & mask.0;
            if subset == 0 {
                break;
            }
        }
    }

    table
}
