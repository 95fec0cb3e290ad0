use std::fmt;
use std::rc::Rc;

use crate::data::Data;
use crate::env::Env;
use crate::error::CommandError;
use crate::input::Input;
use crate::node::{Node, Routed};
use crate::output::Output;

use super::{Mode, Walk};

/// Deferred work run against the output after a successful walk.
pub type ExecutorFn = Rc<dyn Fn(&mut dyn Output, &Data) -> anyhow::Result<()>>;

/// Side effects collected while executing.
#[derive(Clone, Default)]
pub struct ExecuteData {
    /// Script lines, in traversal order.
    pub executable: Vec<String>,
    /// Wrap the script in a shell function before running it.
    pub function_wrap: bool,
    pub(crate) executors: Vec<ExecutorFn>,
}

const WRAPPER_FUNCTION: &str = "_cmdgraph_execute";

impl ExecuteData {
    /// The script to hand to the shell, wrapped if requested.
    pub fn script(&self) -> Vec<String> {
        if !self.function_wrap || self.executable.is_empty() {
            return self.executable.clone();
        }
        let mut script = Vec::with_capacity(self.executable.len() + 3);
        script.push(format!("function {} {{", WRAPPER_FUNCTION));
        script.extend(self.executable.iter().map(|line| format!("  {}", line)));
        script.push("}".to_string());
        script.push(WRAPPER_FUNCTION.to_string());
        script
    }

    pub fn executor_count(&self) -> usize {
        self.executors.len()
    }
}

impl fmt::Debug for ExecuteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteData")
            .field("executable", &self.executable)
            .field("function_wrap", &self.function_wrap)
            .field("executors", &self.executors.len())
            .finish()
    }
}

/// Walk the graph from `root` committing values into `data`.
///
/// The first failing processor aborts the walk; whatever it and earlier
/// processors stored stays in `data`. Leftover tokens fail only when the walk
/// itself succeeded. Deferred executors run last, in registration order.
pub fn execute(
    root: &Rc<Node>,
    input: &mut Input,
    data: &mut Data,
    env: &Env,
    out: &mut dyn Output,
) -> Result<ExecuteData, CommandError> {
    let mut exec = ExecuteData::default();
    let walked = {
        let mut w = Walk {
            input: &mut *input,
            data: &mut *data,
            exec: &mut exec,
            env,
            mode: Mode::Execute,
        };
        walk(root, &mut w)
    };
    if let Err(e) = walked {
        tracing::debug!(kind = e.kind(), error = %e, "execution failed");
        return Err(e);
    }
    input.check_processed()?;

    for executor in &exec.executors {
        executor(out, data).map_err(|e| CommandError::Execution(format!("{:#}", e)))?;
    }
    tracing::debug!(
        lines = exec.executable.len(),
        executors = exec.executors.len(),
        "execution finished"
    );
    Ok(exec)
}

fn walk(root: &Rc<Node>, w: &mut Walk<'_>) -> Result<(), CommandError> {
    let mut node = Rc::clone(root);
    loop {
        if let Some(processor) = node.processor() {
            processor.process(w)?;
        }
        let Some(edge) = node.edge() else {
            return Ok(());
        };
        match edge.next(w)? {
            Routed::Node(next) => node = next,
            Routed::Stop | Routed::Suggest(_) => return Ok(()),
        }
    }
}
