//! Whole-canvas color wash that walks around the hue wheel.

use crate::domain::color::{Color, ColorGrid, GridError, GridSize};
use crate::domain::program::{Program, Tick};

#[derive(Debug, Clone)]
pub struct Wash {
    hue: u16,
    step: u16,
}

impl Wash {
    pub fn new(step: u16) -> Self {
        Self { hue: 0, step: step % 360 }
    }
}

impl Program for Wash {
    fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
        let frame = ColorGrid::filled(size, Color::from_hue(self.hue))?;
        self.hue = (self.hue + self.step) % 360;
        Ok(frame)
    }
}
