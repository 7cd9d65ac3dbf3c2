use std::{fmt::Display, str::FromStr};

use int_enum::IntEnum;

use crate::Error;

/// State of one tile in the seats layout, stored as the byte it's written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntEnum)]
#[repr(u8)]
pub enum CellState {
    Floor = b'.',
    Empty = b'L',
    Occupied = b'#',
}

impl TryFrom<char> for CellState {
    type Error = Error;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(|b| CellState::try_from(b).ok())
            .ok_or(Error::InvalidCellCharacter(value))
    }
}

impl From<CellState> for char {
    fn from(value: CellState) -> Self {
        char::from(u8::from(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub r: usize,
    pub c: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}

impl Position {
    pub fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }
}

/// One generation of the seats layout, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatGrid {
    cells: Vec<CellState>,
    row_n: usize,
    col_n: usize,
}

impl Display for SeatGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.col_n.max(1)) {
            for cell in row {
                write!(f, "{}", char::from(*cell))?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl FromStr for SeatGrid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = SeatGridBuilder::new();
        for l in s.lines() {
            builder.add_row(l)?;
        }

        Ok(builder.build())
    }
}

impl SeatGrid {
    /// Bounds-checked lookup, out-of-range positions are a contract violation of the caller.
    pub fn cell_at(&self, row: usize, col: usize) -> Result<CellState, Error> {
        let pos = Position::new(row, col);
        self.cell(&pos)
            .copied()
            .ok_or(Error::OutOfRangeAccess(pos, self.row_n, self.col_n))
    }

    pub fn cell(&self, pos: &Position) -> Option<&CellState> {
        self.pos_to_ind(pos).map(|ind| &self.cells[ind])
    }

    pub fn count(&self, c_state: CellState) -> usize {
        self.cells.iter().filter(|s| **s == c_state).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.count(CellState::Occupied)
    }

    pub fn rows(&self) -> usize {
        self.row_n
    }

    pub fn cols(&self) -> usize {
        self.col_n
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_n, self.col_n)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.row_n).flat_map(move |r| (0..self.col_n).map(move |c| Position::new(r, c)))
    }

    pub(crate) fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    pub(crate) fn ind_to_pos(&self, ind: usize) -> Position {
        Position::new(ind / self.col_n, ind % self.col_n)
    }

    fn pos_to_ind(&self, pos: &Position) -> Option<usize> {
        if pos.r >= self.row_n || pos.c >= self.col_n {
            None
        } else {
            Some(pos.r * self.col_n + pos.c)
        }
    }
}

pub(crate) struct SeatGridBuilder {
    cells: Vec<CellState>,
    row_n: usize,
    col_n: Option<usize>,
}

impl SeatGridBuilder {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            row_n: 0,
            col_n: None,
        }
    }

    pub fn add_row(&mut self, row_text: &str) -> Result<(), Error> {
        let row_text = row_text.strip_suffix('\r').unwrap_or(row_text);
        let cell_n = row_text.chars().count();
        let expect_n = *self.col_n.get_or_insert(cell_n);
        if expect_n != cell_n {
            return Err(Error::ShapeMismatch(cell_n, expect_n));
        }

        for c in row_text.chars() {
            self.cells.push(CellState::try_from(c)?);
        }
        self.row_n += 1;

        Ok(())
    }

    pub fn build(self) -> SeatGrid {
        SeatGrid {
            cells: self.cells,
            row_n: self.row_n,
            col_n: self.col_n.unwrap_or(0),
        }
    }
}

#[test]
fn test_parse_layout() {
    let grid = SeatGrid::from_str("L.#\n#L.\n").unwrap();
    assert_eq!(grid.shape(), (2, 3));
    assert_eq!(grid.cell_at(0, 0).unwrap(), CellState::Empty);
    assert_eq!(grid.cell_at(0, 1).unwrap(), CellState::Floor);
    assert_eq!(grid.cell_at(0, 2).unwrap(), CellState::Occupied);
    assert_eq!(grid.cell_at(1, 0).unwrap(), CellState::Occupied);
    assert_eq!(grid.occupied_count(), 2);
    assert_eq!(grid.count(CellState::Empty), 2);
    assert_eq!(grid.to_string(), "L.#\n#L.\n");
}

#[test]
fn test_parse_crlf_layout() {
    let grid = SeatGrid::from_str("L.\r\n.L\r\n").unwrap();
    assert_eq!(grid.shape(), (2, 2));
    assert_eq!(grid.count(CellState::Empty), 2);
}

#[test]
fn test_parse_empty_layout() {
    let grid = SeatGrid::from_str("").unwrap();
    assert_eq!(grid.shape(), (0, 0));
    assert_eq!(grid.occupied_count(), 0);
    assert_eq!(grid.positions().count(), 0);
}

#[test]
fn test_parse_invalid_char() {
    assert!(matches!(
        SeatGrid::from_str("L.L\nLxL\n"),
        Err(Error::InvalidCellCharacter('x'))
    ));
    assert!(matches!(
        SeatGrid::from_str("L座"),
        Err(Error::InvalidCellCharacter('座'))
    ));
}

#[test]
fn test_parse_ragged_rows() {
    assert!(matches!(
        SeatGrid::from_str("L.L\nLL\n"),
        Err(Error::ShapeMismatch(2, 3))
    ));
}

#[test]
fn test_cell_at_out_of_range() {
    let grid = SeatGrid::from_str("LL\nLL\n").unwrap();
    assert!(matches!(
        grid.cell_at(2, 0),
        Err(Error::OutOfRangeAccess(Position { r: 2, c: 0 }, 2, 2))
    ));
    assert!(matches!(grid.cell_at(0, 2), Err(Error::OutOfRangeAccess(..))));
    assert!(grid.cell(&Position::new(1, 1)).is_some());
}

#[test]
fn test_grid_equality() {
    let a = SeatGrid::from_str("L.#\n").unwrap();
    let b = SeatGrid::from_str("L.#\n").unwrap();
    let c = SeatGrid::from_str("#.#\n").unwrap();
    let d = SeatGrid::from_str("L\n.\n#\n").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}
