//! Built-in animation programs.
//!
//! | Name    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `cross` | A row and a column that sweep across the canvas diagonally. |
//! | `wash`  | The whole canvas in one color, stepping around the hue wheel.|
//! | `random`| The whole canvas in one random color, new every frame.      |
//! | `off`   | Solid black.                                                |
//!
//! New effects are added by implementing [`Program`] and registering a name.

pub mod cross;
pub mod random;
pub mod solid;
pub mod wash;

pub use cross::Cross;
pub use random::RandomFill;
pub use solid::Solid;
pub use wash::Wash;

use crate::domain::color::Color;
use crate::domain::program::{Program, ProgramError, ProgramSet};

/// Tunables for the built-in programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectOptions {
    /// Line color of `cross`.
    pub cross_color: Color,
    /// Hue degrees `wash` advances per frame.
    pub wash_step: u16,
    /// Fixed seed for `random`; `None` seeds from the OS.
    pub random_seed: Option<u64>,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            cross_color: Color::RED,
            wash_step: 7,
            random_seed: None,
        }
    }
}

/// Builds the program set containing every built-in effect.
///
/// # Errors
///
/// Only fails if two built-ins share a name.
pub fn builtin_programs(options: &EffectOptions) -> Result<ProgramSet, ProgramError> {
    let random = match options.random_seed {
        Some(seed) => RandomFill::seeded(seed),
        None => RandomFill::from_entropy(),
    };
    let builtins: [(&str, Box<dyn Program>); 4] = [
        ("cross", Box::new(Cross::new(options.cross_color))),
        ("wash", Box::new(Wash::new(options.wash_step))),
        ("random", Box::new(random)),
        ("off", Box::new(Solid::new(Color::BLACK))),
    ];
    let mut set = ProgramSet::new();
    for (name, program) in builtins {
        set.register(name, program)?;
    }
    Ok(set)
}
