use std::{
    fmt::{Display, Write},
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not},
    str::FromStr,
};

use miette::Context;

#[derive(Debug, Default, Hash, PartialEq, Eq, PartialOrd, Clone, Copy)]
#[repr(transparent)]
pub struct BitBoard(pub u64);

impl BitAndAssign for BitBoard {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}

impl BitOrAssign for BitBoard {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitXorAssign for BitBoard {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0
    }
}

impl BitOr for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl BitBoard {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = Self(u64::MAX);

    #[inline(always)]
    pub const fn from_square(sq: Square) -> Self {
        Self(1 << sq.0)
    }

    #[inline(always)]
    pub const fn set(&mut self, pos: usize) {
        self.0 |= 1 << pos;
    }

    #[inline(always)]
    pub const fn capture(&mut self, index: usize) {
        self.0 &= !(1 << index);
    }

    #[inline(always)]
    pub fn pop_count(&self) -> u32 {
        #[cfg(all(target_arch = "x86_64", target_feature = "popcnt"))]
        {
            unsafe { std::arch::x86_64::_popcnt64(self.0 as i64) as u32 }
        }
        #[cfg(not(all(target_arch = "x86_64", target_feature = "popcnt")))]
        {
            self.0.count_ones()
        }
    }

    /// Gathers the bits of `self` selected by `mask` into the low bits of the result.
    ///
    /// Uses the BMI2 instruction when the target enables it and a serial
    /// bit-by-bit deposit otherwise. Both produce identical indices, so the
    /// slider tables built by one are valid for the other.
    #[inline(always)]
    pub fn pext(&self, mask: BitBoard) -> u64 {
        #[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
        {
            unsafe { std::arch::x86_64::_pext_u64(self.0, mask.0) }
        }
        #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
        {
            let mut result = 0u64;
            let mut remaining = mask.0;
            let mut bit = 1u64;
            while remaining != 0 {
                let lowest = remaining & remaining.wrapping_neg();
                if self.0 & lowest != 0 {
                    result |= bit;
                }
                remaining &= remaining - 1;
                bit <<= 1;
            }
            result
        }
    }

    pub fn print_bitboard(&self) -> String {
        let mut out = String::with_capacity(8 * 8 * 2);
        for rank in (0..8).rev() {
            let row = (0..8)
                .map(|file| {
                    if self.contains_square(rank * 8 + file) {
                        "1"
                    } else {
                        "0"
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(out, "{row}");
        }
        out
    }

    #[inline(always)]
    pub fn lsb(&self) -> Option<u64> {
        if self.0 == 0 {
            return None;
        }
        #[cfg(all(target_arch = "x86_64", target_feature = "bmi1"))]
        {
            Some(unsafe { std::arch::x86_64::_tzcnt_u64(self.0) })
        }
        #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi1")))]
        {
            Some(self.0.trailing_zeros() as u64)
        }
    }

    #[inline(always)]
    pub fn pop_lsb(&mut self) -> u64 {
        let idx = self.0.trailing_zeros() as u64;
        #[cfg(all(target_arch = "x86_64", target_feature = "bmi1"))]
        {
            self.0 = unsafe { std::arch::x86_64::_blsr_u64(self.0) };
        }
        #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi1")))]
        {
            self.0 &= self.0 - 1;
        }
        idx
    }

    #[inline(always)]
    pub fn msb(&self) -> Option<u64> {
        if self.0 == 0 {
            None
        } else {
            Some(63 - self.0.leading_zeros() as u64)
        }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn any(&self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    pub const fn iter_bits(&self) -> BitBoardIterator {
        BitBoardIterator { remaining: self.0 }
    }

    #[inline(always)]
    pub const fn contains_square(&self, index: usize) -> bool {
        (self.0 & (1 << index)) != 0
    }

    #[inline(always)]
    pub const fn contains(&self, sq: Square) -> bool {
        self.contains_square(sq.index())
    }

    /// Nearest set bit when walking away from the origin: lowest for rays that
    /// increase the square index, highest for rays that decrease it.
    #[inline(always)]
    pub fn get_closest_bit(&self, forward: bool) -> Option<u64> {
        if forward { self.lsb() } else { self.msb() }
    }
}

/// Iterator that yields each set bit position in a BitBoard
pub struct BitBoardIterator {
    remaining: u64,
}

impl Iterator for BitBoardIterator {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let idx = self.remaining.trailing_zeros() as usize;
        self.remaining &= self.remaining - 1;
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let exact = self.remaining.count_ones() as usize;
        (exact, Some(exact))
    }
}

impl ExactSizeIterator for BitBoardIterator {}

#[derive(Default, Debug, Hash, PartialEq, Eq, PartialOrd, Clone, Copy)]
pub enum Side {
    #[default]
    White,
    Black,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

impl Not for Side {
    type Output = Side;

    fn not(self) -> Self::Output {
        self.flip()
    }
}

impl Side {
    pub const SIDES: [Side; 2] = [Side::White, Side::Black];

    pub const fn flip(&self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    pub const fn is_white(&self) -> bool {
        matches!(self, Side::White)
    }

    /// Signed square offset of a single pawn push.
    pub const fn forward(&self) -> i8 {
        match self {
            Side::White => 8,
            Side::Black => -8,
        }
    }

    /// Rank (0 indexed) a piece of this side starts its pawns on.
    pub const fn pawn_rank(&self) -> usize {
        match self {
            Side::White => 1,
            Side::Black => 6,
        }
    }

    /// Rank (0 indexed) this side's pawns promote on.
    pub const fn promotion_rank(&self) -> usize {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }

    /// Rank (0 indexed) on which this side's pawns may capture en passant.
    pub const fn en_passant_rank(&self) -> usize {
        match self {
            Side::White => 4,
            Side::Black => 3,
        }
    }

    pub const fn back_rank(&self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }
}

#[derive(Default, PartialEq, Eq, Debug, PartialOrd, Clone, Copy, Hash)]
pub enum Piece {
    #[default]
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Piece::Pawn => write!(f, "Pawn"),
            Piece::Knight => write!(f, "Knight"),
            Piece::Bishop => write!(f, "Bishop"),
            Piece::Rook => write!(f, "Rook"),
            Piece::Queen => write!(f, "Queen"),
            Piece::King => write!(f, "King"),
        }
    }
}

impl Piece {
    pub const PIECES: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    /// Pieces kept in bitboards. The king lives in a square scalar instead.
    pub const BITBOARD_PIECES: [Piece; 5] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
    ];

    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    pub const PIECE_CHARS: [[char; 6]; 2] = [
        ['P', 'N', 'B', 'R', 'Q', 'K'], // White
        ['p', 'n', 'b', 'r', 'q', 'k'], // Black
    ];

    pub fn from_char(c: char) -> Option<(Piece, Side)> {
        let side = if c.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some((piece, side))
    }

    #[inline(always)]
    pub const fn to_char(&self, side: Side) -> char {
        Self::PIECE_CHARS[side.index()][self.index()]
    }

    #[inline(always)]
    pub const fn phase(&self) -> i32 {
        match self {
            Piece::Pawn => 0,
            Piece::Bishop => 1,
            Piece::Knight => 1,
            Piece::Rook => 2,
            Piece::Queen => 4,
            Piece::King => 0,
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        match self {
            Piece::Pawn => 0,
            Piece::Knight => 1,
            Piece::Bishop => 2,
            Piece::Rook => 3,
            Piece::Queen => 4,
            Piece::King => 5,
        }
    }

    #[inline(always)]
    pub const fn is_slider(&self) -> bool {
        matches!(self, Piece::Bishop | Piece::Rook | Piece::Queen)
    }
}

/// Castling rights are stored in the low nibble of a [`u8`]:
/// ```text
/// Bit: 3 2 1 0
///      q k Q K
///      | | | |
///      | | | +-- White kingside right
///      | | +---- White queenside right
///      | +------ Black kingside right
///      +-------- Black queenside right
/// ```
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Clone, Copy, Default)]
#[repr(transparent)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NO_CASTLING: u8 = 0;
    /// White King side castling
    pub const WHITE_00: u8 = 0b0001;
    /// White Queen side castling
    pub const WHITE_000: u8 = 0b0010;
    /// Black King side castling
    pub const BLACK_00: u8 = 0b0100;
    /// Black Queen side castling
    pub const BLACK_000: u8 = 0b1000;

    pub const WHITE_CASTLING: Self = Self(Self::WHITE_00 | Self::WHITE_000);
    pub const BLACK_CASTLING: Self = Self(Self::BLACK_00 | Self::BLACK_000);
    pub const ANY_CASTLING: Self = Self(Self::BLACK_CASTLING.0 | Self::WHITE_CASTLING.0);

    #[inline(always)]
    pub const fn all() -> Self {
        Self::ANY_CASTLING
    }

    #[inline(always)]
    pub const fn empty() -> Self {
        Self(Self::NO_CASTLING)
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == Self::NO_CASTLING
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn add_right(&mut self, right: u8) {
        self.0 |= right;
    }

    #[inline(always)]
    pub const fn remove_right(&mut self, rights: u8) {
        self.0 &= !rights
    }

    /// Bit for the given side and wing.
    #[inline(always)]
    pub const fn right_for(side: Side, kingside: bool) -> u8 {
        match (side, kingside) {
            (Side::White, true) => Self::WHITE_00,
            (Side::White, false) => Self::WHITE_000,
            (Side::Black, true) => Self::BLACK_00,
            (Side::Black, false) => Self::BLACK_000,
        }
    }

    #[inline(always)]
    pub const fn can_castle(&self, side: Side, kingside: bool) -> bool {
        self.0 & Self::right_for(side, kingside) != 0
    }

    /// Rights lost when a piece leaves or lands on `sq`. Only the king and
    /// rook home squares carry any.
    #[inline(always)]
    pub const fn lost_on(sq: Square) -> u8 {
        match sq.index() {
            0 => Self::WHITE_000,
            4 => Self::WHITE_00 | Self::WHITE_000,
            7 => Self::WHITE_00,
            56 => Self::BLACK_000,
            60 => Self::BLACK_00 | Self::BLACK_000,
            63 => Self::BLACK_00,
            _ => Self::NO_CASTLING,
        }
    }
}

impl Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (bit, c) in [
            (Self::WHITE_00, 'K'),
            (Self::WHITE_000, 'Q'),
            (Self::BLACK_00, 'k'),
            (Self::BLACK_000, 'q'),
        ] {
            if self.0 & bit != 0 {
                f.write_char(c)?;
            }
        }
        Ok(())
    }
}

/// Represents a single square on the board.
/// # Representation
/// ```text
///  A8(56) B8 C8 D8 E8 F8 G8 H8(63)
///  ...
///  A1(0)  B1 C1 D1 E1 F1 G1 H1(7)
///```
#[derive(Default, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    /// Returns a Square from a given index. Will return None if index is out of bounds
    #[inline(always)]
    pub const fn new(index: usize) -> Option<Self> {
        if index < 64 {
            return Some(Self(index as u8));
        }
        None
    }

    /// Square from an index the caller already knows to be on the board.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < 64);
        Self(index as u8)
    }

    /// Returns a Square from a given file and rank, both 0 indexed.
    #[inline(always)]
    pub const fn from_coords(file: usize, rank: usize) -> Option<Self> {
        if file < 8 && rank < 8 {
            return Some(Square((rank * 8 + file) as u8));
        }
        None
    }

    /// 0 indexed rank
    #[inline(always)]
    pub const fn row(&self) -> usize {
        (self.0 / 8) as usize
    }

    /// 0 indexed file
    #[inline(always)]
    pub const fn col(&self) -> usize {
        (self.0 % 8) as usize
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Square `delta` indices away. The caller guarantees the result is on the board.
    #[inline(always)]
    pub const fn offset(&self, delta: i8) -> Self {
        Self::from_index((self.0 as i8 + delta) as usize)
    }

    /// Same square seen from the other side of the board.
    #[inline(always)]
    pub const fn flip(&self) -> Self {
        Self(self.0 ^ 56)
    }
}

impl From<Square> for usize {
    fn from(value: Square) -> Self {
        value.index()
    }
}

impl FromStr for Square {
    type Err = miette::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        miette::ensure!(
            s.len() == 2,
            "Square needs 1 Letter and 1 Number to construct, got {s:?}"
        );
        let s = s.to_ascii_lowercase();
        let mut iter = s.chars();
        let letter = iter.next().context("1st char should be letter")?;
        let num = iter.next().context("2nd char should be number")?;
        miette::ensure!(
            ('a'..='h').contains(&letter),
            "Invalid file {letter:?}, expected one of a..h"
        );
        miette::ensure!(
            ('1'..='8').contains(&num),
            "Invalid rank {num:?}, expected one of 1..8"
        );
        let file = (letter as u8 - b'a') as usize;
        let rank = (num as u8 - b'1') as usize;

        Ok(Self::from_index(8 * rank + file))
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = (self.0 % 8) + b'a';
        let rank = (self.0 / 8) + b'1';
        write!(f, "{}{}", file as char, rank as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_bitboard() {
        let out = "0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0
0 0 0 0 1 0 0 0
0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0
0 0 0 0 0 0 0 0
";
        let b = BitBoard(1 << 28);
        assert_eq!(out, b.print_bitboard())
    }

    #[test]
    fn test_display_square() {
        assert_eq!(format!("{}", Square(0)), "a1");
        assert_eq!(format!("{}", Square(7)), "h1");
        assert_eq!(format!("{}", Square(11)), "d2");
        assert_eq!(format!("{}", Square(28)), "e4");
        assert_eq!(format!("{}", Square(56)), "a8");
        assert_eq!(format!("{}", Square(63)), "h8");
    }

    #[test]
    fn test_parse_square() {
        assert_eq!("e4".parse::<Square>().unwrap(), Square(28));
        assert_eq!("H8".parse::<Square>().unwrap(), Square(63));
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn test_pext_matches_bit_gather() {
        let mask = BitBoard(0b1011_0100);
        assert_eq!(BitBoard(0).pext(mask), 0);
        assert_eq!(BitBoard(0b1011_0100).pext(mask), 0b1111);
        assert_eq!(BitBoard(0b0010_0100).pext(mask), 0b0101);
        assert_eq!(BitBoard(0b1000_0000).pext(mask), 0b1000);
        // bits outside the mask are ignored
        assert_eq!(BitBoard(0b0100_1011).pext(mask), 0);
    }

    #[test]
    fn test_bit_scans() {
        let mut bb = BitBoard(0b1010_0000);
        assert_eq!(bb.lsb(), Some(5));
        assert_eq!(bb.msb(), Some(7));
        assert_eq!(bb.pop_lsb(), 5);
        assert_eq!(bb.pop_count(), 1);
        assert_eq!(BitBoard::EMPTY.lsb(), None);
        assert_eq!(BitBoard(0x8100).iter_bits().collect::<Vec<_>>(), vec![8, 15]);
    }

    #[test]
    fn test_castling_rights_display() {
        assert_eq!(CastlingRights::all().to_string(), "KQkq");
        assert_eq!(CastlingRights::empty().to_string(), "-");
        assert_eq!(
            CastlingRights(CastlingRights::WHITE_000 | CastlingRights::BLACK_00).to_string(),
            "Qk"
        );
    }

    #[test]
    fn test_rights_lost_on_home_squares() {
        assert_eq!(
            CastlingRights::lost_on(Square::E1),
            CastlingRights::WHITE_CASTLING.0
        );
        assert_eq!(CastlingRights::lost_on(Square::H8), CastlingRights::BLACK_00);
        assert_eq!(
            CastlingRights::lost_on(Square::from_index(28)),
            CastlingRights::NO_CASTLING
        );
    }
}
