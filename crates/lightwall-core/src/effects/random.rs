//! Whole-canvas fill with a fresh random color every frame.
//!
//! The generator is a seedable [`StdRng`], so a fixed seed replays the same
//! color sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::color::{Color, ColorGrid, GridError, GridSize};
use crate::domain::program::{Program, Tick};

#[derive(Debug, Clone)]
pub struct RandomFill {
    rng: StdRng,
}

impl RandomFill {
    /// Reproducible sequence starting from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    fn next_color(&mut self) -> Color {
        let [r, g, b]: [u8; 3] = self.rng.gen();
        Color::new(r, g, b)
    }
}

impl Program for RandomFill {
    fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
        let color = self.next_color();
        ColorGrid::filled(size, color)
    }
}
