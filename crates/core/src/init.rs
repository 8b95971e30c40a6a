//! Two-phase initialization flag

use crate::error::InitError;

/// One-shot initialization state for a storage namespace
///
/// [`Initializable::initializer`] wraps the top-level `init`; per-layer
/// `init_unchained` steps call [`Initializable::only_initializing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Initializable {
    initialized: bool,
    initializing: bool,
}

impl Initializable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    /// Run `f` as the one and only initialization
    ///
    /// The flag is only committed when `f` succeeds.
    pub fn initializer<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<InitError>,
    {
        if self.initialized || self.initializing {
            return Err(InitError::AlreadyInitialized.into());
        }

        self.initializing = true;
        let result = f(self);
        self.initializing = false;
        if result.is_ok() {
            self.initialized = true;
        }
        result
    }

    /// Require an enclosing [`Initializable::initializer`]
    pub fn only_initializing(&self) -> Result<(), InitError> {
        if self.initializing {
            Ok(())
        } else {
            Err(InitError::NotInitializing)
        }
    }
}
