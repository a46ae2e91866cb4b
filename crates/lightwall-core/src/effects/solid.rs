//! A single fixed color.

use crate::domain::color::{Color, ColorGrid, GridError, GridSize};
use crate::domain::program::{Program, Tick};

#[derive(Debug, Clone)]
pub struct Solid {
    color: Color,
}

impl Solid {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Program for Solid {
    fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
        ColorGrid::filled(size, self.color)
    }
}
