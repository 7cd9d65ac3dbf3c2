use std::mem;

use log::{debug, info, trace};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};

use crate::{CellState, Error, NeighborStrategy, SeatGrid};

/// How a seat reacts to the count of occupied seats it sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyRule {
    crowding_threshold: usize,
}

impl OccupancyRule {
    pub fn new(crowding_threshold: usize) -> Self {
        Self { crowding_threshold }
    }

    pub fn crowding_threshold(&self) -> usize {
        self.crowding_threshold
    }

    pub fn next_state(&self, cell: CellState, occupied_n: usize) -> CellState {
        match cell {
            CellState::Empty if occupied_n == 0 => CellState::Occupied,
            CellState::Occupied if occupied_n >= self.crowding_threshold => CellState::Empty,
            other => other,
        }
    }
}

/// Computes the generation after `current` into `next`, returns the count of changed cells.
///
/// Every cell is decided from `current` alone, so `next` may hold anything before the call.
pub fn step(
    current: &SeatGrid,
    next: &mut SeatGrid,
    strategy: &NeighborStrategy,
    rule: &OccupancyRule,
) -> usize {
    assert_eq!(
        current.shape(),
        next.shape(),
        "Read and write buffers of seats layout have different shapes."
    );

    let mut chg_count = 0;
    for (ind, pos) in current.positions().enumerate() {
        let cell = current.cells()[ind];
        let new_cell = match cell {
            CellState::Floor => CellState::Floor,
            _ => rule.next_state(cell, strategy.occupied_around(current, &pos)),
        };
        if new_cell != cell {
            chg_count += 1;
        }
        next.cells_mut()[ind] = new_cell;
    }

    chg_count
}

/// Same as [`step`], with cells spread over the rayon thread pool.
pub fn step_parallel(
    current: &SeatGrid,
    next: &mut SeatGrid,
    strategy: &NeighborStrategy,
    rule: &OccupancyRule,
) -> usize {
    assert_eq!(
        current.shape(),
        next.shape(),
        "Read and write buffers of seats layout have different shapes."
    );

    next.cells_mut()
        .par_iter_mut()
        .enumerate()
        .map(|(ind, new_cell)| {
            let cell = current.cells()[ind];
            *new_cell = match cell {
                CellState::Floor => CellState::Floor,
                _ => {
                    let pos = current.ind_to_pos(ind);
                    rule.next_state(cell, strategy.occupied_around(current, &pos))
                }
            };
            usize::from(*new_cell != cell)
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Running,
    Converged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimOutcome {
    /// Generations which changed the layout before it stabilized.
    pub generations: usize,
    pub occupied: usize,
}

/// Callbacks of [`SeatSimulator::run_with_observer`], all default to doing nothing.
pub trait SimObserver {
    /// Called after each generation which changed the layout, `grid` is the new layout.
    fn on_generation(&mut self, _generation: usize, _grid: &SeatGrid, _changed: usize) {}

    fn on_converged(&mut self, _outcome: &SimOutcome) {}
}

pub struct NoopObserver;

impl SimObserver for NoopObserver {}

pub struct SeatSimulator {
    current: SeatGrid,
    next: SeatGrid,
    strategy: NeighborStrategy,
    rule: OccupancyRule,
    generation: usize,
    state: SimState,
    parallel: bool,
}

impl SeatSimulator {
    pub fn new(grid: SeatGrid, strategy: NeighborStrategy, rule: OccupancyRule) -> Self {
        Self {
            next: grid.clone(),
            current: grid,
            strategy,
            rule,
            generation: 0,
            state: SimState::Running,
            parallel: false,
        }
    }

    /// Simulator with the crowding threshold the strategy is normally paired with.
    pub fn with_strategy(grid: SeatGrid, strategy: NeighborStrategy) -> Self {
        let rule = OccupancyRule::new(strategy.default_threshold());
        Self::new(grid, strategy, rule)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn grid(&self) -> &SeatGrid {
        &self.current
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn occupied_count(&self) -> usize {
        self.current.occupied_count()
    }

    pub fn tick(&mut self) -> SimState {
        self.tick_observed(&mut NoopObserver)
    }

    pub fn run(&mut self, max_generations: Option<usize>) -> Result<SimOutcome, Error> {
        self.run_with_observer(max_generations, &mut NoopObserver)
    }

    /// Ticks until the layout stops changing. With `max_generations`, fails once a generation
    /// beyond that count still changes the layout.
    pub fn run_with_observer<O: SimObserver>(
        &mut self,
        max_generations: Option<usize>,
        observer: &mut O,
    ) -> Result<SimOutcome, Error> {
        loop {
            match self.tick_observed(observer) {
                SimState::Converged => {
                    let outcome = SimOutcome {
                        generations: self.generation,
                        occupied: self.occupied_count(),
                    };
                    info!(
                        "Seats layout stabilized after {} generation(s) with {} occupied seat(s).",
                        outcome.generations, outcome.occupied
                    );
                    observer.on_converged(&outcome);
                    return Ok(outcome);
                }
                SimState::Running => {
                    if let Some(max_gen) = max_generations.filter(|m| self.generation > *m) {
                        return Err(Error::NonConvergence(max_gen));
                    }
                }
            }
        }
    }

    fn tick_observed<O: SimObserver>(&mut self, observer: &mut O) -> SimState {
        if self.state == SimState::Converged {
            return self.state;
        }

        let chg_count = if self.parallel {
            step_parallel(&self.current, &mut self.next, &self.strategy, &self.rule)
        } else {
            step(&self.current, &mut self.next, &self.strategy, &self.rule)
        };

        if self.next == self.current {
            self.state = SimState::Converged;
        } else {
            mem::swap(&mut self.current, &mut self.next);
            self.generation += 1;
            debug!(
                "Generation {}: {} cell(s) changed.",
                self.generation, chg_count
            );
            trace!("\n{}", self.current);
            observer.on_generation(self.generation, &self.current, chg_count);
        }

        self.state
    }
}

#[cfg(test)]
use std::str::FromStr;

#[cfg(test)]
const EXAMPLE_LAYOUT: &str = "L.LL.LL.LL
LLLLLLL.LL
L.L.L..L..
LLLL.LL.LL
L.LL.LL.LL
L.LLLLL.LL
..L.L.....
LLLLLLLLLL
L.LLLLLL.L
L.LLLLL.LL
";

#[test]
fn test_occupancy_rule() {
    let rule = OccupancyRule::new(4);
    assert_eq!(rule.next_state(CellState::Floor, 0), CellState::Floor);
    assert_eq!(rule.next_state(CellState::Empty, 0), CellState::Occupied);
    assert_eq!(rule.next_state(CellState::Empty, 1), CellState::Empty);
    assert_eq!(rule.next_state(CellState::Occupied, 3), CellState::Occupied);
    assert_eq!(rule.next_state(CellState::Occupied, 4), CellState::Empty);
    assert_eq!(rule.next_state(CellState::Occupied, 8), CellState::Empty);
}

#[test]
fn test_first_step_fills_every_seat() {
    let current = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut next = current.clone();
    let strategy = NeighborStrategy::Immediate;
    let chg_count = step(&current, &mut next, &strategy, &OccupancyRule::new(4));
    assert_eq!(chg_count, current.count(CellState::Empty));
    assert_eq!(next.occupied_count(), current.count(CellState::Empty));
    assert_eq!(next.count(CellState::Floor), current.count(CellState::Floor));
}

#[test]
fn test_step_is_simultaneous() {
    // Seats filling in reading order would leave the second seat empty.
    let current = SeatGrid::from_str("LL\n").unwrap();
    let mut next = current.clone();
    step(&current, &mut next, &NeighborStrategy::Immediate, &OccupancyRule::new(4));
    assert_eq!(next.to_string(), "##\n");
}

#[test]
fn test_parallel_step_matches_sequential() {
    let mut grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    for strategy in [NeighborStrategy::Immediate, NeighborStrategy::LineOfSight] {
        let rule = OccupancyRule::new(strategy.default_threshold());
        for _ in 0..4 {
            let mut seq_next = grid.clone();
            let mut par_next = grid.clone();
            let seq_chg = step(&grid, &mut seq_next, &strategy, &rule);
            let par_chg = step_parallel(&grid, &mut par_next, &strategy, &rule);
            assert_eq!(seq_next, par_next);
            assert_eq!(seq_chg, par_chg);
            grid = seq_next;
        }
    }
}

#[test]
#[should_panic]
fn test_step_rejects_mismatched_buffers() {
    let current = SeatGrid::from_str("LL\n").unwrap();
    let mut next = SeatGrid::from_str("L\nL\n").unwrap();
    step(&current, &mut next, &NeighborStrategy::Immediate, &OccupancyRule::new(4));
}

#[test]
fn test_immediate_converges_to_37() {
    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut sim = SeatSimulator::with_strategy(grid, NeighborStrategy::Immediate);
    let outcome = sim.run(None).unwrap();
    assert_eq!(outcome.occupied, 37);
    assert_eq!(outcome.generations, 5);
    assert_eq!(sim.state(), SimState::Converged);
}

#[test]
fn test_line_of_sight_converges_to_26() {
    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut sim = SeatSimulator::with_strategy(grid, NeighborStrategy::LineOfSight);
    let outcome = sim.run(None).unwrap();
    assert_eq!(outcome.occupied, 26);
    assert_eq!(outcome.generations, 6);
}

#[test]
fn test_parallel_run_converges_to_same_outcome() {
    for strategy in [NeighborStrategy::Immediate, NeighborStrategy::LineOfSight] {
        let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
        let seq = SeatSimulator::with_strategy(grid.clone(), strategy)
            .run(None)
            .unwrap();
        let par = SeatSimulator::with_strategy(grid, strategy)
            .parallel(true)
            .run(None)
            .unwrap();
        assert_eq!(seq, par);
    }
}

#[test]
fn test_run_is_deterministic() {
    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut sim_a = SeatSimulator::with_strategy(grid.clone(), NeighborStrategy::LineOfSight);
    let mut sim_b = SeatSimulator::with_strategy(grid, NeighborStrategy::LineOfSight);
    assert_eq!(sim_a.run(None).unwrap(), sim_b.run(None).unwrap());
    assert_eq!(sim_a.grid(), sim_b.grid());
}

#[test]
fn test_fixed_point_is_idempotent() {
    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut sim = SeatSimulator::with_strategy(grid, NeighborStrategy::Immediate);
    sim.run(None).unwrap();
    let fixed = sim.grid().clone();
    let mut next = fixed.clone();
    let rule = OccupancyRule::new(4);
    for _ in 0..3 {
        assert_eq!(step(&fixed, &mut next, &NeighborStrategy::Immediate, &rule), 0);
        assert_eq!(next, fixed);
    }
    assert_eq!(sim.tick(), SimState::Converged);
    assert_eq!(sim.generation(), 5);
}

#[test]
fn test_all_floor_converges_immediately() {
    for strategy in [NeighborStrategy::Immediate, NeighborStrategy::LineOfSight] {
        let grid = SeatGrid::from_str("....\n....\n....\n").unwrap();
        let outcome = SeatSimulator::with_strategy(grid, strategy)
            .run(None)
            .unwrap();
        assert_eq!(
            outcome,
            SimOutcome {
                generations: 0,
                occupied: 0
            }
        );
    }
}

#[test]
fn test_empty_layout_converges_immediately() {
    let grid = SeatGrid::from_str("").unwrap();
    let outcome = SeatSimulator::with_strategy(grid, NeighborStrategy::LineOfSight)
        .run(Some(0))
        .unwrap();
    assert_eq!(outcome.generations, 0);
    assert_eq!(outcome.occupied, 0);
}

#[test]
fn test_isolated_seat_occupied_after_one_generation() {
    for strategy in [NeighborStrategy::Immediate, NeighborStrategy::LineOfSight] {
        for text in ["...\n.L.\n...\n", "L\n"] {
            let grid = SeatGrid::from_str(text).unwrap();
            let mut sim = SeatSimulator::with_strategy(grid, strategy);
            assert_eq!(sim.tick(), SimState::Running);
            assert_eq!(sim.generation(), 1);
            assert_eq!(sim.occupied_count(), 1);
            assert_eq!(sim.tick(), SimState::Converged);
            assert_eq!(sim.generation(), 1);
            assert_eq!(sim.occupied_count(), 1);
        }
    }
}

#[test]
fn test_generation_cap() {
    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut sim = SeatSimulator::with_strategy(grid.clone(), NeighborStrategy::Immediate);
    assert!(matches!(sim.run(Some(4)), Err(Error::NonConvergence(4))));

    let mut sim = SeatSimulator::with_strategy(grid, NeighborStrategy::Immediate);
    assert_eq!(sim.run(Some(5)).unwrap().occupied, 37);
}

#[test]
fn test_observer_sees_every_generation() {
    struct Recorder {
        generations: Vec<(usize, usize)>,
        outcome: Option<SimOutcome>,
    }

    impl SimObserver for Recorder {
        fn on_generation(&mut self, generation: usize, grid: &SeatGrid, _changed: usize) {
            self.generations.push((generation, grid.occupied_count()));
        }

        fn on_converged(&mut self, outcome: &SimOutcome) {
            self.outcome = Some(*outcome);
        }
    }

    let grid = SeatGrid::from_str(EXAMPLE_LAYOUT).unwrap();
    let mut recorder = Recorder {
        generations: Vec::new(),
        outcome: None,
    };
    let outcome = SeatSimulator::with_strategy(grid, NeighborStrategy::Immediate)
        .run_with_observer(None, &mut recorder)
        .unwrap();
    assert_eq!(
        recorder.generations.iter().map(|(g, _)| *g).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(recorder.generations.last().map(|(_, o)| *o), Some(37));
    assert_eq!(recorder.outcome, Some(outcome));
}
