//! SelectModeUseCase: the running-mode handle shared with the frame generator.
//!
//! The active mode is the name of the [`Program`](lightwall_core::Program) the
//! generator asks for the next frame.  The handle is created once at start-up
//! from the program set and passed explicitly to whoever needs it; there is no
//! global mode variable.
//!
//! Mode names are compared by string value.  Every switch is validated against
//! the names that existed at start-up, so the generator can never be asked for
//! a program that does not exist.

use std::sync::{PoisonError, RwLock};

use lightwall_core::{ProgramError, ProgramSet};
use tracing::info;

/// Thread-safe, validated running-mode selector.
#[derive(Debug)]
pub struct ModeSelector {
    available: Vec<String>,
    active: RwLock<String>,
}

impl ModeSelector {
    /// Creates a selector over the programs in `programs`, starting in `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::UnknownProgram`] if `initial` is not registered.
    pub fn new(programs: &ProgramSet, initial: &str) -> Result<Self, ProgramError> {
        programs.validate(initial)?;
        Ok(Self {
            available: programs.names(),
            active: RwLock::new(initial.to_string()),
        })
    }

    /// Name of the active program.
    pub fn active(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names that can be switched to, sorted.
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// Switches the active program.  Takes effect on the next generated frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::UnknownProgram`] and keeps the current mode if
    /// `mode` is not one of [`ModeSelector::available`].
    pub fn switch_to(&self, mode: &str) -> Result<(), ProgramError> {
        if !self.available.iter().any(|name| name == mode) {
            return Err(ProgramError::UnknownProgram {
                name: mode.to_string(),
                available: self.available.clone(),
            });
        }
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if *active != mode {
            info!("switching mode {} -> {mode}", *active);
            *active = mode.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightwall_core::effects::{builtin_programs, EffectOptions};

    fn programs() -> ProgramSet {
        builtin_programs(&EffectOptions::default()).unwrap()
    }

    #[test]
    fn test_new_with_known_mode_is_active() {
        let selector = ModeSelector::new(&programs(), "cross").unwrap();
        assert_eq!(selector.active(), "cross");
        assert_eq!(selector.available(), ["cross", "off", "random", "wash"]);
    }

    #[test]
    fn test_new_with_unknown_mode_fails_at_startup() {
        let err = ModeSelector::new(&programs(), "disco").unwrap_err();
        assert!(matches!(err, ProgramError::UnknownProgram { ref name, .. } if name == "disco"));
    }

    #[test]
    fn test_switch_to_compares_by_value() {
        let selector = ModeSelector::new(&programs(), "cross").unwrap();
        let requested: String = ["wa", "sh"].concat();

        selector.switch_to(&requested).unwrap();

        assert_eq!(selector.active(), "wash");
    }

    #[test]
    fn test_switch_to_unknown_keeps_current_mode() {
        let selector = ModeSelector::new(&programs(), "off").unwrap();
        assert!(selector.switch_to("strobe").is_err());
        assert_eq!(selector.active(), "off");
    }
}
