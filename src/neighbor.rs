use once_cell::sync::Lazy;

use crate::{CellState, Position, SeatGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Direction {
    pub fn all() -> &'static [Direction] {
        static ALL_DIRS: Lazy<[Direction; 8]> = Lazy::new(|| {
            [
                Direction::TopLeft,
                Direction::Top,
                Direction::TopRight,
                Direction::Left,
                Direction::Right,
                Direction::BottomLeft,
                Direction::Bottom,
                Direction::BottomRight,
            ]
        });

        ALL_DIRS.as_ref()
    }
}

impl Position {
    /// Next position along given direction, `None` if it would leave the first row or column.
    /// Positions beyond the last row or column are left for the grid to reject.
    pub fn along_dir(&self, dir: Direction) -> Option<Self> {
        match dir {
            Direction::TopLeft if self.r > 0 && self.c > 0 => {
                Some(Position::new(self.r - 1, self.c - 1))
            }
            Direction::Top if self.r > 0 => Some(Position::new(self.r - 1, self.c)),
            Direction::TopRight if self.r > 0 => Some(Position::new(self.r - 1, self.c + 1)),
            Direction::Left if self.c > 0 => Some(Position::new(self.r, self.c - 1)),
            Direction::Right => Some(Position::new(self.r, self.c + 1)),
            Direction::BottomLeft if self.c > 0 => Some(Position::new(self.r + 1, self.c - 1)),
            Direction::Bottom => Some(Position::new(self.r + 1, self.c)),
            Direction::BottomRight => Some(Position::new(self.r + 1, self.c + 1)),
            _ => None,
        }
    }
}

/// Rule deciding which occupied seats a seat "sees".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborStrategy {
    /// The 8 adjacent tiles.
    Immediate,
    /// The first seat in each of the 8 directions, looking over floor.
    LineOfSight,
}

impl NeighborStrategy {
    pub fn occupied_around(&self, grid: &SeatGrid, pos: &Position) -> usize {
        Direction::all()
            .iter()
            .filter(|dir| self.sees_occupied(grid, pos, **dir))
            .count()
    }

    /// Crowding threshold the original rules use with this strategy.
    pub fn default_threshold(&self) -> usize {
        match self {
            NeighborStrategy::Immediate => 4,
            NeighborStrategy::LineOfSight => 5,
        }
    }

    fn sees_occupied(&self, grid: &SeatGrid, pos: &Position, dir: Direction) -> bool {
        match self {
            NeighborStrategy::Immediate => pos
                .along_dir(dir)
                .and_then(|p| grid.cell(&p).copied())
                .is_some_and(|s| s == CellState::Occupied),
            NeighborStrategy::LineOfSight => {
                let mut cur_pos = *pos;
                while let Some(next_pos) = cur_pos.along_dir(dir) {
                    match grid.cell(&next_pos) {
                        Some(CellState::Floor) => cur_pos = next_pos,
                        Some(CellState::Occupied) => return true,
                        Some(CellState::Empty) | None => return false,
                    }
                }

                false
            }
        }
    }
}

#[cfg(test)]
use std::str::FromStr;

#[test]
fn test_immediate_count() {
    let grid = SeatGrid::from_str("###\n#L#\n###\n").unwrap();
    let strategy = NeighborStrategy::Immediate;
    assert_eq!(strategy.occupied_around(&grid, &Position::new(1, 1)), 8);
    assert_eq!(strategy.occupied_around(&grid, &Position::new(0, 0)), 2);
    assert_eq!(strategy.occupied_around(&grid, &Position::new(0, 1)), 3);
    assert_eq!(strategy.occupied_around(&grid, &Position::new(2, 2)), 2);
}

#[test]
fn test_immediate_ignores_far_seats() {
    let grid = SeatGrid::from_str("#..\n...\n..L\n").unwrap();
    let strategy = NeighborStrategy::Immediate;
    assert_eq!(strategy.occupied_around(&grid, &Position::new(2, 2)), 0);
}

#[test]
fn test_line_of_sight_sees_eight() {
    let text = [
        ".......#.",
        "...#.....",
        ".#.......",
        ".........",
        "..#L....#",
        "....#....",
        ".........",
        "#........",
        "...#.....",
    ]
    .join("\n");
    let grid = SeatGrid::from_str(&text).unwrap();
    assert_eq!(
        NeighborStrategy::LineOfSight.occupied_around(&grid, &Position::new(4, 3)),
        8
    );
    assert_eq!(
        NeighborStrategy::Immediate.occupied_around(&grid, &Position::new(4, 3)),
        2
    );
}

#[test]
fn test_line_of_sight_blocked_by_empty_seat() {
    let grid = SeatGrid::from_str(".............\n.L.L.#.#.#.#.\n.............\n").unwrap();
    assert_eq!(
        NeighborStrategy::LineOfSight.occupied_around(&grid, &Position::new(1, 1)),
        0
    );
    assert_eq!(
        NeighborStrategy::LineOfSight.occupied_around(&grid, &Position::new(1, 3)),
        1
    );
}

#[test]
fn test_line_of_sight_sees_nothing() {
    let text = [
        ".##.##.", "#.#.#.#", "##...##", "...L...", "##...##", "#.#.#.#", ".##.##.",
    ]
    .join("\n");
    let grid = SeatGrid::from_str(&text).unwrap();
    assert_eq!(
        NeighborStrategy::LineOfSight.occupied_around(&grid, &Position::new(3, 3)),
        0
    );
}

#[test]
fn test_corner_counts_stay_in_bounds() {
    let grid = SeatGrid::from_str("#.#\n...\n#.#\n").unwrap();
    for strategy in [NeighborStrategy::Immediate, NeighborStrategy::LineOfSight] {
        for pos in grid.positions() {
            let n = strategy.occupied_around(&grid, &pos);
            assert!(n <= 8);
        }
    }
    assert_eq!(
        NeighborStrategy::Immediate.occupied_around(&grid, &Position::new(0, 0)),
        0
    );
    assert_eq!(
        NeighborStrategy::LineOfSight.occupied_around(&grid, &Position::new(0, 0)),
        3
    );
}

#[test]
fn test_line_of_sight_equals_immediate_without_floor() {
    let grid = SeatGrid::from_str("#L##L\nL#L#L\n##LL#\nL###L\n").unwrap();
    for pos in grid.positions() {
        assert_eq!(
            NeighborStrategy::LineOfSight.occupied_around(&grid, &pos),
            NeighborStrategy::Immediate.occupied_around(&grid, &pos)
        );
    }
}
