use serde::{Deserialize, Serialize};

use crate::prelude::*;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Type safe wrapper for game phase
/// The value is scaled from 0 (midgame) to 256 (full endgame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Phase(pub i32);

impl Phase {
    /// Maps [`Board::material_phase`] onto the 0..=256 scale.
    pub const fn from_material(material_phase: i32) -> Self {
        let remaining = if material_phase > TOTAL_PHASE {
            TOTAL_PHASE
        } else if material_phase < 0 {
            0
        } else {
            material_phase
        };
        Phase(((TOTAL_PHASE - remaining) * ENDGAME_PHASE + TOTAL_PHASE / 2) / TOTAL_PHASE)
    }

    pub fn of(board: &Board) -> Self {
        Self::from_material(board.material_phase())
    }
}

/// Score that holds seperate values for midgame and endgame
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize,
)]
pub struct Score {
    // MidGame score
    pub mg: i32,
    // EndGame score
    pub eg: i32,
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MG: {}, EG: {}", self.mg, self.eg)
    }
}

impl Score {
    #[inline(always)]
    pub const fn new(mg: i32, eg: i32) -> Self {
        Self { mg, eg }
    }

    /// Same value in both phases
    #[inline(always)]
    pub const fn splat(score: i32) -> Self {
        Self {
            mg: score,
            eg: score,
        }
    }

    #[inline]
    pub const fn taper(&self, phase: Phase) -> i32 {
        let mg_w = ENDGAME_PHASE - phase.0;
        let eg_w = phase.0;
        ((self.mg * mg_w) + (self.eg * eg_w)) / ENDGAME_PHASE
    }

    /// Both phases summed, without interpolation
    #[inline(always)]
    pub const fn sum(&self) -> i32 {
        self.mg + self.eg
    }
}

impl Add for Score {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            mg: self.mg + rhs.mg,
            eg: self.eg + rhs.eg,
        }
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Self) {
        self.mg += rhs.mg;
        self.eg += rhs.eg;
    }
}

impl Sub for Score {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            mg: self.mg - rhs.mg,
            eg: self.eg - rhs.eg,
        }
    }
}

impl SubAssign for Score {
    fn sub_assign(&mut self, rhs: Self) {
        self.mg -= rhs.mg;
        self.eg -= rhs.eg;
    }
}

impl Neg for Score {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            mg: -self.mg,
            eg: -self.eg,
        }
    }
}

impl Mul<i32> for Score {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self {
            mg: self.mg * rhs,
            eg: self.eg * rhs,
        }
    }
}
