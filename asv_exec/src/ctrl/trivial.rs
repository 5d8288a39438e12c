//! Constant output controller

use super::clamp_output;

/// Always outputs the same value, used for throttle when no feedback is wanted.
#[derive(Debug, Clone, Copy)]
pub struct TrivialController {
    output: f64,
}

impl TrivialController {
    pub fn new(output: f64) -> Self {
        Self {
            output: clamp_output(output),
        }
    }

    pub fn get(&self) -> f64 {
        self.output
    }
}
