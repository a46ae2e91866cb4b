//! Moving cross: one lit column and one lit row on a black background.
//!
//! Each frame the column moves one pixel right and the row one pixel down,
//! both wrapping at the canvas edge.

use crate::domain::color::{Color, ColorGrid, GridError, GridSize};
use crate::domain::program::{Program, Tick};

#[derive(Debug, Clone)]
pub struct Cross {
    color: Color,
    column: u32,
    row: u32,
}

impl Cross {
    pub fn new(color: Color) -> Self {
        Self { color, column: 0, row: 0 }
    }

    /// Current `(column, row)` phase.
    pub fn phase(&self) -> (u32, u32) {
        (self.column, self.row)
    }
}

impl Program for Cross {
    fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
        let mut frame = ColorGrid::new(size)?;
        // The canvas may have shrunk since the last frame.
        let column = self.column % size.width;
        let row = self.row % size.height;

        for y in 0..size.height {
            frame.set(column, y, self.color)?;
        }
        for x in 0..size.width {
            frame.set(x, row, self.color)?;
        }

        self.column = (column + 1) % size.width;
        self.row = (row + 1) % size.height;
        Ok(frame)
    }
}
