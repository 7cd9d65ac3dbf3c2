use anyhow::{Context, Result};
use clap::Parser;
use seat_layout::{CLIArgs, NeighborStrategy, SeatSimulator};

fn main() -> Result<()> {
    env_logger::init();
    let args = CLIArgs::parse();
    let grid = seat_layout::read_grid(&args.input_path).with_context(|| {
        format!(
            "Failed to read map of seats layout from given input file({}).",
            args.input_path.display()
        )
    })?;

    let outcome = SeatSimulator::with_strategy(grid, NeighborStrategy::Immediate)
        .parallel(args.parallel)
        .run(args.max_generations)
        .context("Failed to simulate seats layout with adjacent seats rule.")?;

    println!(
        "After {} generation(s), given seats layout stabilizes, and there are {} seats occupied.",
        outcome.generations, outcome.occupied
    );

    Ok(())
}
