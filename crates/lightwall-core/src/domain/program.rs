//! Animation programs and the named program set.
//!
//! A [`Program`] paints one complete canvas-sized frame per tick.  Programs
//! are registered under a name in a [`ProgramSet`]; the running mode selects
//! one of them by name.  The set is fixed once the pipeline starts, so an
//! unknown mode is always caught at start-up (see [`ProgramSet::validate`]).

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use super::color::{ColorGrid, GridError, GridSize};

/// Errors raised while building or querying a [`ProgramSet`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// The requested mode names no registered program.
    #[error("unknown program {name:?}; available: {available:?}")]
    UnknownProgram { name: String, available: Vec<String> },

    /// A program with this name is already registered.
    #[error("duplicate program name: {0}")]
    DuplicateProgram(String),
}

/// Per-tick context handed to [`Program::next_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Number of frames generated before this one.
    pub frame: u64,
    /// Time since the frame generator started.
    pub elapsed: Duration,
}

/// Capability implemented by every animation effect.
///
/// Implementations keep only bounded internal phase (e.g. an offset wrapped
/// modulo the canvas size) and are deterministic given that phase.
pub trait Program: Send {
    /// Produces the next frame, which must be exactly `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] when a frame of `size` cannot be built.
    fn next_frame(&mut self, size: GridSize, tick: &Tick) -> Result<ColorGrid, GridError>;
}

/// Named animation programs available to the running-mode selector.
#[derive(Default)]
pub struct ProgramSet {
    programs: HashMap<String, Box<dyn Program>>,
}

impl ProgramSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a program under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::DuplicateProgram`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        program: Box<dyn Program>,
    ) -> Result<(), ProgramError> {
        let name = name.into();
        if self.programs.contains_key(&name) {
            return Err(ProgramError::DuplicateProgram(name));
        }
        self.programs.insert(name, program);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.programs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Checks that `mode` names a registered program.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::UnknownProgram`] listing the available names.
    pub fn validate(&self, mode: &str) -> Result<(), ProgramError> {
        if self.contains(mode) {
            Ok(())
        } else {
            Err(ProgramError::UnknownProgram {
                name: mode.to_string(),
                available: self.names(),
            })
        }
    }

    /// Mutable access to the named program.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Program + 'static)> {
        self.programs.get_mut(name).map(|p| p.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Color;

    struct Fill(Color);

    impl Program for Fill {
        fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
            ColorGrid::filled(size, self.0)
        }
    }

    #[test]
    fn test_register_and_lookup_by_value_equal_name() {
        let mut set = ProgramSet::new();
        set.register("fill", Box::new(Fill(Color::RED))).unwrap();

        // A freshly allocated String must match: selection is by value.
        let mode = String::from("fi") + "ll";
        let program = set.get_mut(&mode).expect("program present");
        let frame = program.next_frame(GridSize::new(2, 2), &Tick::default()).unwrap();

        assert_eq!(frame.get(1, 1), Some(Color::RED));
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut set = ProgramSet::new();
        set.register("fill", Box::new(Fill(Color::RED))).unwrap();
        assert_eq!(
            set.register("fill", Box::new(Fill(Color::BLUE))),
            Err(ProgramError::DuplicateProgram("fill".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_mode_lists_available_names() {
        let mut set = ProgramSet::new();
        set.register("b", Box::new(Fill(Color::RED))).unwrap();
        set.register("a", Box::new(Fill(Color::RED))).unwrap();

        assert_eq!(
            set.validate("zzz"),
            Err(ProgramError::UnknownProgram {
                name: "zzz".to_string(),
                available: vec!["a".to_string(), "b".to_string()],
            })
        );
        assert!(set.validate("a").is_ok());
    }
}
