//! Tile grid
//!
//! The authoritative tile layout of an arena. Coordinates address the padded
//! grid (playable area plus a one-tile border on every side), with `(0, 0)` in
//! the bottom-left corner and `y` growing upwards.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

/// State of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Outer wall ring
    Border,
    /// Indestructible lattice pillar
    HardBlock,
    /// Destructible block, may drop an item
    SoftBlock,
    #[default]
    Free,
}

impl Cell {
    /// Blocks movement and explosions
    pub fn is_solid(self) -> bool {
        !matches!(self, Cell::Free)
    }

    pub fn is_destructible(self) -> bool {
        matches!(self, Cell::SoftBlock)
    }

    /// Collision layers occupied by this tile
    pub fn layers(self) -> LayerMask {
        match self {
            Cell::Border | Cell::HardBlock => LayerMask::HARD_BLOCK,
            Cell::SoftBlock => LayerMask::SOFT_BLOCK,
            Cell::Free => LayerMask::NONE,
        }
    }

    fn glyph(self) -> char {
        match self {
            Cell::Border => '#',
            Cell::HardBlock => 'X',
            Cell::SoftBlock => '+',
            Cell::Free => '.',
        }
    }
}

/// Set of collision layers, used for blocking and pass-through queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const HARD_BLOCK: Self = Self(1 << 0);
    pub const SOFT_BLOCK: Self = Self(1 << 1);
    pub const BOMB: Self = Self(1 << 2);
    pub const PLAYER: Self = Self(1 << 3);
    pub const ENEMY: Self = Self(1 << 4);
    pub const ITEM: Self = Self(1 << 5);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Layers of `self` that are not in `other`
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// Propagation order used by explosions
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::Y,
            Direction::Down => IVec2::NEG_Y,
            Direction::Right => IVec2::X,
            Direction::Left => IVec2::NEG_X,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

/// Padded tile grid with its spawn geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    spawn_width: i32,
    spawn_protection: bool,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an all-free grid. `width`/`height` are the padded dimensions.
    pub fn new(width: u32, height: u32, spawn_width: u32, spawn_protection: bool) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            spawn_width: i32::try_from(spawn_width).unwrap_or(i32::MAX),
            spawn_protection,
            cells: vec![Cell::Free; len],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn dimensions(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn spawn_width(&self) -> i32 {
        self.spawn_width
    }

    pub fn spawn_protection(&self) -> bool {
        self.spawn_protection
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: IVec2) -> ArenaResult<usize> {
        if self.contains(cell) {
            Ok(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            Err(ArenaError::OutOfBounds {
                x: cell.x,
                y: cell.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn cell(&self, cell: IVec2) -> ArenaResult<Cell> {
        let index = self.index(cell)?;
        Ok(self.cells[index])
    }

    pub fn set_cell(&mut self, cell: IVec2, state: Cell) -> ArenaResult<()> {
        let index = self.index(cell)?;
        self.cells[index] = state;
        Ok(())
    }

    /// Tile state, treating anything outside the grid as a border wall
    pub fn cell_or_border(&self, cell: IVec2) -> Cell {
        self.cell(cell).unwrap_or(Cell::Border)
    }

    /// Collision layers of the tile at `cell` (out of range counts as hard)
    pub fn layers_at(&self, cell: IVec2) -> LayerMask {
        self.cell_or_border(cell).layers()
    }

    /// Turn a soft block into free ground. Returns whether anything changed.
    pub fn clear_soft_block(&mut self, cell: IVec2) -> ArenaResult<bool> {
        let index = self.index(cell)?;
        if self.cells[index] == Cell::SoftBlock {
            self.cells[index] = Cell::Free;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn is_border(&self, cell: IVec2) -> ArenaResult<bool> {
        self.index(cell)?;
        Ok(self.border_at(cell.x, cell.y))
    }

    pub fn is_hard_block_lattice(&self, cell: IVec2) -> ArenaResult<bool> {
        self.index(cell)?;
        Ok(self.lattice_at(cell.x, cell.y))
    }

    /// Whether the cell belongs to one of the four spawn zones
    pub fn is_within_spawn(&self, cell: IVec2) -> ArenaResult<bool> {
        self.index(cell)?;
        Ok(self.spawn_at(cell.x, cell.y))
    }

    /// Whether spawn protection forces a soft block on this cell
    pub fn is_critical_point(&self, cell: IVec2) -> ArenaResult<bool> {
        self.index(cell)?;
        Ok(self.critical_at(cell.x, cell.y))
    }

    pub(crate) fn border_at(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    // Pillars sit on even coordinates; on an even axis the parity flips at
    // the midpoint so the pattern mirrors around the centre.
    pub(crate) fn lattice_at(&self, x: i32, y: i32) -> bool {
        x % 2 == lattice_parity(x, self.width) && y % 2 == lattice_parity(y, self.height)
    }

    pub(crate) fn spawn_at(&self, x: i32, y: i32) -> bool {
        if self.border_at(x, y) {
            return false;
        }
        self.spawn_arm(x, y, self.width, self.height) || self.spawn_arm(y, x, self.height, self.width)
    }

    pub(crate) fn critical_at(&self, x: i32, y: i32) -> bool {
        if !self.spawn_protection || self.border_at(x, y) || self.spawn_at(x, y) {
            return false;
        }
        self.arm_tip(x, y, self.height, self.width)
            || self.arm_tip(y, x, self.width, self.height)
            || self.spawn_ring(x, y, self.width, self.height)
            || self.spawn_ring(y, x, self.height, self.width)
    }

    /// `a` runs along an outer lane, `b` lies within the arm span of a corner
    fn spawn_arm(&self, a: i32, b: i32, a_len: i32, b_len: i32) -> bool {
        (a == 1 || a == a_len - 2) && self.in_arm_span(b, b_len)
    }

    /// First cell past the end of a spawn arm
    fn arm_tip(&self, a: i32, b: i32, a_len: i32, b_len: i32) -> bool {
        (a == 1 || a == b_len - 2) && (b == self.spawn_width + 1 || b == a_len - self.spawn_width - 2)
    }

    /// Inner lane running alongside a spawn arm
    fn spawn_ring(&self, a: i32, b: i32, a_len: i32, b_len: i32) -> bool {
        (a == 2 || a == a_len - 3) && self.in_arm_span(b, b_len)
    }

    fn in_arm_span(&self, b: i32, b_len: i32) -> bool {
        b <= self.spawn_width || b >= b_len - self.spawn_width - 1
    }

    /// Iterate all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, Cell)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| (IVec2::new(i as i32 % width, i as i32 / width), c))
    }

    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }
}

fn lattice_parity(v: i32, len: i32) -> i32 {
    if len % 2 == 0 && v >= len / 2 { 1 } else { 0 }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                write!(f, "{}", self.cell_or_border(IVec2::new(x, y)).glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
