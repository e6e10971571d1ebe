//! Per-tick context handed to components

use crate::core::globals::SharedGlobals;
use crate::foundation::time::Timer;
use crate::input::Input;
use crate::scene::Transforms;

/// Everything a component may read or mutate during the input and update phases
pub struct FrameContext<'a> {
    /// Input state of the current tick
    pub input: &'a Input,
    /// Frame timer
    pub timer: &'a Timer,
    /// Shared registry
    pub globals: &'a mut SharedGlobals,
    /// Transform arena of the scene
    pub transforms: &'a mut Transforms,
}

impl<'a> FrameContext<'a> {
    /// Bundle the per-tick state
    pub fn new(
        input: &'a Input,
        timer: &'a Timer,
        globals: &'a mut SharedGlobals,
        transforms: &'a mut Transforms,
    ) -> Self {
        Self {
            input,
            timer,
            globals,
            transforms,
        }
    }
}
