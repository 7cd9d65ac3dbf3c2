mod grid;
mod neighbor;
mod sim;

use std::{
    error,
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::Parser;

pub use grid::{CellState, Position, SeatGrid};
pub use neighbor::{Direction, NeighborStrategy};
pub use sim::{
    step, step_parallel, NoopObserver, OccupancyRule, SeatSimulator, SimObserver, SimOutcome,
    SimState,
};

#[derive(Debug)]
pub enum Error {
    IOError(io::Error),
    ShapeMismatch(usize, usize), // (element count of current row, expect count of elements in earlier row).
    InvalidCellCharacter(char),
    OutOfRangeAccess(Position, usize, usize), // (accessed position, row count, column count).
    NonConvergence(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IOError(ioe) => write!(f, "I/O error: {}", ioe),
            Error::ShapeMismatch(cur_count, expect_count) => write!(
                f,
                "Given row({} elements), expect row which have {} elements.",
                cur_count, expect_count
            ),
            Error::InvalidCellCharacter(c) => write!(f, "Invalid character({}) for seat", c),
            Error::OutOfRangeAccess(pos, row_n, col_n) => write!(
                f,
                "Position {} is out of the seats layout({} rows x {} columns).",
                pos, row_n, col_n
            ),
            Error::NonConvergence(max_gen) => write!(
                f,
                "Seats layout doesn't stabilize within {} generation(s).",
                max_gen
            ),
        }
    }
}

impl error::Error for Error {}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    pub input_path: PathBuf,
    /// Give up if the layout still changes after this many generations.
    #[arg(long)]
    pub max_generations: Option<usize>,
    /// Compute each generation on the rayon thread pool.
    #[arg(long)]
    pub parallel: bool,
}

pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<SeatGrid, Error> {
    let file = File::open(path).map_err(Error::IOError)?;
    let reader = BufReader::new(file);
    let mut builder = grid::SeatGridBuilder::new();
    for l in reader.lines() {
        let s = l.map_err(Error::IOError)?;
        builder.add_row(&s)?;
    }

    Ok(builder.build())
}
