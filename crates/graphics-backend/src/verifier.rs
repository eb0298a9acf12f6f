use std::collections::{HashMap, HashSet};

use graphics_types::commands::Command;
use graphics_types::handles::Handle;
use graphics_types::error::UrcError;
use log::warn;

/// Per-frame bookkeeping for the "update-before-draw" rule (spec.md §4.G):
/// for every resource handle referenced by a bind/draw packet, remember the
/// ordinal of its *first* such reference; any update targeting that handle
/// must have been recorded strictly earlier.
#[derive(Default)]
pub struct Verifier {
    first_reference: HashMap<Handle, usize>,
    /// Handles already warned about in release mode, so a violation is
    /// logged exactly once per handle per run (spec.md §4.G, §8 scenario S4).
    warned_once: HashSet<Handle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub handle: Handle,
    pub offending_op: &'static str,
    pub prior_draw_op: &'static str,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.first_reference.clear();
    }

    /// Scans a fully-recorded command stream and returns every ordering
    /// violation found, in record order. Debug-mode callers should treat any
    /// non-empty result as fatal; release-mode callers should log each
    /// violation once per handle (see [`Verifier::warn_once`]).
    pub fn check(&mut self, commands: &[Command]) -> Vec<Violation> {
        self.first_reference.clear();
        for (ordinal, cmd) in commands.iter().enumerate() {
            // Only bind/draw-family packets establish a "first reference" —
            // an update command referencing its own target isn't a read of it.
            if cmd.is_update() {
                continue;
            }
            if let Some(handle) = cmd.referenced_handle() {
                self.first_reference.entry(handle).or_insert(ordinal);
            }
        }

        let mut violations = Vec::new();
        for (ordinal, cmd) in commands.iter().enumerate() {
            if !cmd.is_update() {
                continue;
            }
            let Some(handle) = cmd.referenced_handle() else {
                continue;
            };
            if let Some(&first_ordinal) = self.first_reference.get(&handle) {
                if first_ordinal <= ordinal {
                    violations.push(Violation {
                        handle,
                        offending_op: cmd.op_name(),
                        prior_draw_op: commands[first_ordinal].op_name(),
                    });
                }
            }
        }
        violations
    }

    /// Emits exactly one warning per handle per process lifetime for
    /// release-mode ordering violations.
    pub fn warn_once(&mut self, violation: &Violation) {
        if self.warned_once.insert(violation.handle) {
            warn!(
                "ordering violation: {:?} updated by {} after being referenced by {}",
                violation.handle, violation.offending_op, violation.prior_draw_op
            );
        }
    }

    pub fn to_fatal_error(violation: &Violation) -> UrcError {
        UrcError::OrderingViolation {
            handle: violation.handle,
            op: violation.offending_op,
        }
    }
}
