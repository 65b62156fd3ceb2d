// Bitboard masks, iterators and precomputed attack tables shared by move
// generation, evaluation and search.

// File masks (A is column 0, H column 7)
pub const FILE_A: u64 = 0x0101010101010101;
pub const FILE_H: u64 = 0x8080808080808080;

pub const NOT_FILE_A: u64 = !FILE_A;
pub const NOT_FILE_H: u64 = !FILE_H;

// Rank masks (A1 is square 0)
pub const RANK_1: u64 = 0x00000000000000FF;
pub const RANK_2: u64 = 0x000000000000FF00;
pub const RANK_4: u64 = 0x00000000FF000000;
pub const RANK_5: u64 = 0x000000FF00000000;
pub const RANK_7: u64 = 0x00FF000000000000;
pub const RANK_8: u64 = 0xFF00000000000000;

/// Ray directions, indexed into the ray tables. The first four are
/// "positive" rays (increasing square index, nearest blocker = LSB),
/// the last four "negative" (nearest blocker = MSB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    North = 0,
    NorthEast = 1,
    East = 2,
    NorthWest = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    SouthEast = 7,
}

pub const ALL_DIRS: [Dir; 8] = [
    Dir::North,
    Dir::NorthEast,
    Dir::East,
    Dir::NorthWest,
    Dir::South,
    Dir::SouthWest,
    Dir::West,
    Dir::SouthEast,
];

pub const ORTHOGONAL_DIRS: [Dir; 4] = [Dir::North, Dir::East, Dir::South, Dir::West];
pub const DIAGONAL_DIRS: [Dir; 4] = [
    Dir::NorthEast,
    Dir::NorthWest,
    Dir::SouthWest,
    Dir::SouthEast,
];

impl Dir {
    /// (file delta, rank delta) of a single step along this ray.
    fn offsets(self) -> (i8, i8) {
        match self {
            Dir::North => (0, 1),
            Dir::NorthEast => (1, 1),
            Dir::East => (1, 0),
            Dir::NorthWest => (-1, 1),
            Dir::South => (0, -1),
            Dir::SouthWest => (-1, -1),
            Dir::West => (-1, 0),
            Dir::SouthEast => (1, -1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::North => Dir::South,
            Dir::NorthEast => Dir::SouthWest,
            Dir::East => Dir::West,
            Dir::NorthWest => Dir::SouthEast,
            Dir::South => Dir::North,
            Dir::SouthWest => Dir::NorthEast,
            Dir::West => Dir::East,
            Dir::SouthEast => Dir::NorthWest,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(
            self,
            Dir::North | Dir::NorthEast | Dir::East | Dir::NorthWest
        )
    }

    pub fn is_orthogonal(self) -> bool {
        matches!(self, Dir::North | Dir::East | Dir::South | Dir::West)
    }
}

// Bit operations
#[inline]
pub fn pop_lsb(bb: &mut u64) -> Option<usize> {
    if *bb == 0 {
        return None;
    }
    let lsb = bb.trailing_zeros() as usize;
    *bb &= *bb - 1;
    Some(lsb)
}

#[inline]
pub fn lsb_index(bb: u64) -> Option<usize> {
    if bb == 0 {
        None
    } else {
        Some(bb.trailing_zeros() as usize)
    }
}

/// Index of the only set bit in `bb`. A mask with zero or several bits set
/// here is a caller bug, not a recoverable condition.
#[inline]
pub fn single_bit_index(bb: u64) -> usize {
    assert!(
        bb.count_ones() == 1,
        "expected exactly one set bit, mask = {:#x}",
        bb
    );
    bb.trailing_zeros() as usize
}

pub struct BitIter {
    bb: u64,
}

impl Iterator for BitIter {
    type Item = usize;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        pop_lsb(&mut self.bb)
    }
}

#[inline]
pub fn iter_bits(bb: u64) -> BitIter {
    BitIter { bb }
}

// Precomputed attack tables using OnceLock for thread safety
use std::sync::OnceLock;

static KNIGHT_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();
static KING_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();
// [color][square]: squares a pawn of that color on `square` attacks
static PAWN_ATTACKS: OnceLock<[[u64; 64]; 2]> = OnceLock::new();
// [dir][square]: full ray from `square` (exclusive) to the board edge
static RAYS: OnceLock<[[u64; 64]; 8]> = OnceLock::new();
// [a][b]: squares strictly between two aligned squares, 0 otherwise
static BETWEEN: OnceLock<Box<[[u64; 64]; 64]>> = OnceLock::new();

fn leap_table(offsets: &[(i8, i8)]) -> [u64; 64] {
    let mut attacks = [0u64; 64];
    for (sq, slot) in attacks.iter_mut().enumerate() {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut mask = 0u64;
        for &(df, dr) in offsets {
            let nf = file + df;
            let nr = rank + dr;
            if (0..8).contains(&nf) && (0..8).contains(&nr) {
                mask |= 1u64 << (nr * 8 + nf);
            }
        }
        *slot = mask;
    }
    attacks
}

fn init_knight_attacks() -> [u64; 64] {
    leap_table(&[
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ])
}

fn init_king_attacks() -> [u64; 64] {
    leap_table(&[
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ])
}

fn init_pawn_attacks() -> [[u64; 64]; 2] {
    // index 0 = white (attacks toward rank 8), 1 = black
    [
        leap_table(&[(-1, 1), (1, 1)]),
        leap_table(&[(-1, -1), (1, -1)]),
    ]
}

fn init_rays() -> [[u64; 64]; 8] {
    let mut rays = [[0u64; 64]; 8];
    for dir in ALL_DIRS {
        let (df, dr) = dir.offsets();
        for sq in 0..64 {
            let mut file = (sq % 8) as i8 + df;
            let mut rank = (sq / 8) as i8 + dr;
            let mut mask = 0u64;
            while (0..8).contains(&file) && (0..8).contains(&rank) {
                mask |= 1u64 << (rank * 8 + file);
                file += df;
                rank += dr;
            }
            rays[dir as usize][sq] = mask;
        }
    }
    rays
}

fn init_between() -> Box<[[u64; 64]; 64]> {
    let rays = RAYS.get_or_init(init_rays);
    let mut between = Box::new([[0u64; 64]; 64]);
    for a in 0..64 {
        for dir in ALL_DIRS {
            let mut along = rays[dir as usize][a];
            while let Some(b) = pop_lsb(&mut along) {
                between[a][b] = rays[dir as usize][a] & rays[dir.opposite() as usize][b];
            }
        }
    }
    between
}

#[inline(always)]
pub fn init_attack_tables() {
    KNIGHT_ATTACKS.get_or_init(init_knight_attacks);
    KING_ATTACKS.get_or_init(init_king_attacks);
    PAWN_ATTACKS.get_or_init(init_pawn_attacks);
    RAYS.get_or_init(init_rays);
    BETWEEN.get_or_init(init_between);
}

#[inline]
pub fn knight_attacks(sq: usize) -> u64 {
    KNIGHT_ATTACKS.get_or_init(init_knight_attacks)[sq]
}

#[inline]
pub fn king_attacks(sq: usize) -> u64 {
    KING_ATTACKS.get_or_init(init_king_attacks)[sq]
}

/// Squares attacked by a pawn of `color_index` (0 = white, 1 = black) on `sq`.
#[inline]
pub fn pawn_attacks(color_index: usize, sq: usize) -> u64 {
    PAWN_ATTACKS.get_or_init(init_pawn_attacks)[color_index][sq]
}

#[inline]
pub fn ray(dir: Dir, sq: usize) -> u64 {
    RAYS.get_or_init(init_rays)[dir as usize][sq]
}

/// Squares strictly between `a` and `b` when aligned on a rank, file or
/// diagonal; empty otherwise.
#[inline]
pub fn between(a: usize, b: usize) -> u64 {
    BETWEEN.get_or_init(init_between)[a][b]
}

/// Attack ray from `sq` along `dir`, truncated just past the nearest blocker
/// in `occ` (the blocker square itself stays in the mask).
#[inline]
pub fn ray_attack(dir: Dir, sq: usize, occ: u64) -> u64 {
    let full = ray(dir, sq);
    let blockers = full & occ;
    if blockers == 0 {
        return full;
    }
    let nearest = if dir.is_positive() {
        blockers.trailing_zeros() as usize
    } else {
        63 - blockers.leading_zeros() as usize
    };
    full & !ray(dir, nearest)
}

#[inline]
pub fn rook_attacks(sq: usize, occ: u64) -> u64 {
    ORTHOGONAL_DIRS
        .iter()
        .fold(0u64, |acc, &d| acc | ray_attack(d, sq, occ))
}

#[inline]
pub fn bishop_attacks(sq: usize, occ: u64) -> u64 {
    DIAGONAL_DIRS
        .iter()
        .fold(0u64, |acc, &d| acc | ray_attack(d, sq, occ))
}

#[inline]
pub fn queen_attacks(sq: usize, occ: u64) -> u64 {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}
