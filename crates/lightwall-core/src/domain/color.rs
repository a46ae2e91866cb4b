//! Colors and the canonical pixel container.
//!
//! A [`ColorGrid`] is a fixed-size 2-D array of [`Color`] values indexed by
//! `(x, y)`.  It is the only pixel container used in Lightwall: devices keep
//! two of them (visible and staging), programs produce them, and frame buffers
//! hand them from one pipeline stage to the next.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by grid construction and pixel access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// A grid must be at least 1×1.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    /// The coordinate lies outside the grid.
    #[error("pixel ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A color string was not of the form `#rrggbb`.
    #[error("invalid color {0:?}: expected \"#rrggbb\"")]
    InvalidColor(String),
}

/// An 8-bit-per-channel RGB triple.
///
/// In configuration files a color is written as a hex string (`"#ff8800"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    /// Creates a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the fully saturated, full-value color at `hue` degrees.
    ///
    /// `hue` is taken modulo 360.
    pub fn from_hue(hue: u16) -> Self {
        let hue = u32::from(hue % 360);
        let sector = hue / 60;
        // Position inside the 60° sector scaled to 0..=255.
        let rising = ((hue % 60) * 255 / 60) as u8;
        let falling = 255 - rising;
        match sector {
            0 => Self::new(255, rising, 0),
            1 => Self::new(falling, 255, 0),
            2 => Self::new(0, 255, rising),
            3 => Self::new(0, falling, 255),
            4 => Self::new(rising, 0, 255),
            _ => Self::new(255, 0, falling),
        }
    }

    /// Scales every channel by `factor`, clamped to `[0.0, 1.0]`.
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Parses a `#rrggbb` (or `rrggbb`) hex string.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidColor`] for anything else.
    pub fn from_hex(hex: &str) -> Result<Self, GridError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GridError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| GridError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Width and height of a grid, a device or the whole canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero (e.g. the canvas of an empty registry).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `true` when `(x, y)` lies inside `0..width × 0..height`.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Number of pixels covered.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A fixed-size 2-D array of colors.
///
/// Dimensions are fixed at construction and every `(x, y)` inside them holds
/// exactly one color.  Pixels are stored row-major.
///
/// Equality is structural: two grids are equal when they have the same size
/// and the same color at every coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGrid {
    size: GridSize,
    pixels: Vec<Color>,
}

impl ColorGrid {
    /// Creates an all-black grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDimensions`] if either dimension is zero.
    pub fn new(size: GridSize) -> Result<Self, GridError> {
        Self::filled(size, Color::BLACK)
    }

    /// Creates a grid with every pixel set to `color`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDimensions`] if either dimension is zero.
    pub fn filled(size: GridSize, color: Color) -> Result<Self, GridError> {
        if size.is_empty() {
            return Err(GridError::EmptyDimensions {
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            size,
            pixels: vec![color; size.area()],
        })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Returns the color at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrites the color at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] when the coordinate is outside the grid.
    pub fn set(&mut self, x: u32, y: u32, color: Color) -> Result<(), GridError> {
        let i = self.index(x, y).ok_or(GridError::OutOfBounds {
            x,
            y,
            width: self.size.width,
            height: self.size.height,
        })?;
        self.pixels[i] = color;
        Ok(())
    }

    /// Sets every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Iterates over `(x, y, color)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        let width = self.size.width;
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, c)| ((i as u32) % width, (i as u32) / width, *c))
    }

    /// Iterates over the pixels of `self` whose color differs from `previous`.
    ///
    /// Coordinates of `self` that `previous` does not cover (the two grids have
    /// different sizes) always count as changed.
    pub fn changed_since<'a>(
        &'a self,
        previous: &'a ColorGrid,
    ) -> impl Iterator<Item = (u32, u32, Color)> + 'a {
        self.iter()
            .filter(move |&(x, y, color)| previous.get(x, y) != Some(color))
    }

    /// Raw row-major pixel slice.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        self.size
            .contains(x, y)
            .then(|| y as usize * self.size.width as usize + x as usize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
