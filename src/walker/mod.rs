//! Graph walkers.
//!
//! Both walkers drive the same processors through the same [`Walk`] context;
//! only [`Mode`] differs. Execute mode commits values and collects script
//! lines. Complete mode stops at the deepest argument and returns suggestions.

mod complete;
mod execute;

pub use complete::complete;
pub(crate) use complete::walk_from;
pub use execute::{execute, ExecuteData, ExecutorFn};

use crate::data::Data;
use crate::env::Env;
use crate::error::CommandError;
use crate::input::Input;

/// Which walker is driving the processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Execute,
    Complete,
}

/// Mutable state threaded through one walk.
pub(crate) struct Walk<'a> {
    pub input: &'a mut Input,
    pub data: &'a mut Data,
    pub exec: &'a mut ExecuteData,
    pub env: &'a Env,
    pub mode: Mode,
}

/// What a processor asks the walker to do next.
#[derive(Debug)]
pub(crate) enum Step {
    Continue,
    /// Complete mode only: this processor owns the final word, stop here.
    Suggest(Completed),
}

/// Outcome of a completion walk.
///
/// A failed walk still carries whatever suggestions were computed before the
/// error.
#[derive(Debug, Default)]
pub struct Completed {
    pub suggestions: Vec<String>,
    pub error: Option<CommandError>,
}

impl Completed {
    pub fn new(suggestions: Vec<String>) -> Self {
        Self {
            suggestions,
            error: None,
        }
    }

    pub fn failed(error: CommandError) -> Self {
        Self {
            suggestions: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
