//! Complete-for-execute: resolve abbreviated tokens to the one value they
//! uniquely denote before conversion.

use crate::argument::Argument;
use crate::completion::Completer;
use crate::data::Data;
use crate::env::Env;
use crate::error::CommandError;
use crate::walker::{Mode, Walk};

/// Resolution policy attached to an argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompleteForExecute {
    allow_exact_match: bool,
    best_effort: bool,
}

impl CompleteForExecute {
    pub fn new() -> Self {
        Self::default()
    }

    /// A candidate equal to the raw token wins even when others also match.
    pub fn allow_exact_match(mut self) -> Self {
        self.allow_exact_match = true;
        self
    }

    /// Keep the raw token instead of failing when resolution does.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

/// Resolve the last popped value and, when the input ran out, the unfilled
/// slots up to the argument's minimum.
///
/// Resolved tokens are written back into the input so a later replay sees the
/// full values.
pub(crate) fn resolve(
    arg: &Argument,
    policy: CompleteForExecute,
    mut values: Vec<String>,
    indices: &[usize],
    exhausted: bool,
    w: &mut Walk<'_>,
) -> Result<Vec<String>, CommandError> {
    let Some(completer) = arg.completer() else {
        return Ok(values);
    };
    let best_effort = policy.best_effort || w.mode == Mode::Complete;

    let mut slots: Vec<usize> = values.len().checked_sub(1).into_iter().collect();
    if exhausted {
        slots.extend(values.len()..arg.min());
    }

    for slot in slots {
        let raw = values.get(slot).cloned().unwrap_or_default();
        let chosen = &values[..slot.min(values.len())];

        // Completers see the list so far.
        let mut so_far = chosen.to_vec();
        so_far.push(raw.clone());
        if let Ok(typed) = arg.value_type().parse(&so_far) {
            w.data.set(arg.name(), typed);
        }

        match resolve_one(arg, completer, policy, &raw, chosen, &*w.data, w.env) {
            Ok(resolved) => {
                tracing::debug!(argument = arg.name(), raw = %raw, resolved = %resolved, "resolved for execute");
                if slot < values.len() {
                    if let Some(&index) = indices.get(slot) {
                        w.input.replace(index, resolved.clone());
                    }
                    values[slot] = resolved;
                } else {
                    w.input.append_used(resolved.clone());
                    values.push(resolved);
                }
            }
            Err(e) if best_effort => {
                tracing::debug!(argument = arg.name(), error = %e, "best-effort resolution kept raw value");
                if slot >= values.len() {
                    break;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(values)
}

fn resolve_one(
    arg: &Argument,
    completer: &dyn Completer,
    policy: CompleteForExecute,
    raw: &str,
    chosen: &[String],
    data: &Data,
    env: &Env,
) -> Result<String, CommandError> {
    let completion = completer
        .complete(raw, data, env)
        .map_err(|e| CommandError::CompletionFetch {
            name: arg.name().to_string(),
            message: format!("{:#}", e),
        })?
        .ok_or_else(|| CommandError::NilCompletion {
            name: arg.name().to_string(),
        })?;

    let mut survivors = completion.filter(raw, chosen);
    if policy.allow_exact_match && survivors.iter().any(|s| s == raw) {
        return Ok(raw.to_string());
    }
    match survivors.len() {
        0 => Err(CommandError::NilCompletion {
            name: arg.name().to_string(),
        }),
        1 => Ok(survivors.remove(0)),
        _ => Err(CommandError::AmbiguousCompletion {
            name: arg.name().to_string(),
            suggestions: survivors,
        }),
    }
}
