use std::rc::Rc;

use crate::data::Data;
use crate::env::Env;
use crate::input::Input;
use crate::node::{Node, Routed};

use super::{Completed, ExecuteData, Mode, Step, Walk};

/// Walk the graph from `root` and return suggestions for the final token.
///
/// Leftover tokens are never an error here; the walk simply ends.
pub fn complete(root: &Rc<Node>, input: &mut Input, data: &mut Data, env: &Env) -> Completed {
    let mut exec = ExecuteData::default();
    let mut w = Walk {
        input,
        data,
        exec: &mut exec,
        env,
        mode: Mode::Complete,
    };
    let completed = walk_from(root, &mut w);
    tracing::debug!(
        suggestions = completed.suggestions.len(),
        failed = completed.error.is_some(),
        "completion finished"
    );
    completed
}

/// Complete-mode traversal starting at `root` with an existing walk context.
pub(crate) fn walk_from(root: &Rc<Node>, w: &mut Walk<'_>) -> Completed {
    let mut node = Rc::clone(root);
    loop {
        if let Some(processor) = node.processor() {
            match processor.process(w) {
                Ok(Step::Continue) => {}
                Ok(Step::Suggest(completed)) => return completed,
                Err(e) => return Completed::failed(e),
            }
        }
        let Some(edge) = node.edge() else {
            return Completed::default();
        };
        match edge.next(w) {
            Ok(Routed::Node(next)) => node = next,
            Ok(Routed::Stop) => return Completed::default(),
            Ok(Routed::Suggest(completed)) => return completed,
            Err(e) => return Completed::failed(e),
        }
    }
}
