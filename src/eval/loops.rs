//! Preview of loop-governed results under the generated `while` rules.
//!
//! Node values never depend on the iteration counter, so every iteration of
//! the preview sees the same `cond`, `cont`, `brk` and body value. The run is
//! therefore decided by the first iteration; the counter only matters for the
//! cap and for logging.

use serde_json::Value;

use super::{EvalState, Interpreter};
use crate::catalog::coerce::{to_number, truthy};
use crate::catalog::{BREAK_PORT, COND_PORT, CONTINUE_PORT, MAX_PORT};

#[derive(Debug, Clone, PartialEq)]
pub struct LoopRun {
    /// Last non-null body value, if any iteration produced one.
    pub value: Option<Value>,
    pub iterations: u64,
}

/// Iteration cap for a loop: the connected `max` (truncated, non-finite or
/// negative counts as 0) or the configured default, bounded by the preview cap.
pub fn iteration_cap(max: Option<Option<Value>>, default_cap: u64, preview_cap: u64) -> u64 {
    let cap = match max {
        None => default_cap,
        Some(v) => {
            let n = to_number(v.as_ref()).trunc();
            if n.is_finite() && n > 0.0 { n as u64 } else { 0 }
        }
    };
    cap.min(preview_cap)
}

pub(crate) fn run_loop(
    interp: &Interpreter,
    state: &mut EvalState,
    while_id: &str,
    root_id: &str,
) -> LoopRun {
    let cond = interp
        .port_value(state, while_id, COND_PORT)
        .is_some_and(|v| truthy(v.as_ref()));
    let cap = iteration_cap(
        interp.port_value(state, while_id, MAX_PORT),
        interp.options.default_loop_cap,
        interp.options.preview_iteration_cap,
    );
    let signal = |state: &mut EvalState, port: &str| {
        interp
            .port_value(state, while_id, port)
            .is_some_and(|v| truthy(v.as_ref()))
    };
    let cont = signal(state, CONTINUE_PORT);
    let brk = signal(state, BREAK_PORT);

    let run = if !cond || cap == 0 {
        LoopRun {
            value: None,
            iterations: 0,
        }
    } else if cont {
        LoopRun {
            value: None,
            iterations: cap,
        }
    } else if brk {
        LoopRun {
            value: None,
            iterations: 0,
        }
    } else {
        let value = interp.value_of(state, root_id).ok().flatten();
        LoopRun {
            value: value.filter(|v| !v.is_null()),
            iterations: cap,
        }
    };

    tracing::trace!(
        while_id,
        root_id,
        iterations = run.iterations,
        "previewed loop"
    );
    run
}
