//! Per-run limits
//!
//! A [`RunConfig`] is handed to the parser and the interpreter for one
//! program. The CLI builds one from its flags; library users start from
//! [`RunConfig::default`] and override fields as needed.

use std::ops::RangeInclusive;

/// Largest magnitude a 9-digit integer literal can have.
pub const INTEGER_LIMIT: i64 = 999_999_999;

/// Stack reserved for the interpreter thread before any call is made
const BASE_STACK: usize = 8 * 1024 * 1024;

/// Stack reserved per nested function call
const STACK_PER_CALL: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Iterations a single loop may run before it is aborted.
    pub max_loop_iterations: usize,
    /// Nested function calls allowed before a call is refused.
    pub max_call_depth: usize,
    /// Values `spit` may return from the entry point.
    pub accepted_exit_codes: Vec<i64>,
    /// Values accepted for Integer input and arithmetic results.
    pub integer_range: RangeInclusive<i64>,
    /// Tokens the parser may discard while looking for a sync point.
    pub max_recovery_attempts: usize,
    /// Syntax errors reported before the parser gives up.
    pub max_syntax_errors: usize,
    /// Largest array dimension a declaration may request.
    pub max_array_length: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_loop_iterations: 10_000,
            max_call_depth: 256,
            accepted_exit_codes: vec![0],
            integer_range: -INTEGER_LIMIT..=INTEGER_LIMIT,
            max_recovery_attempts: 5,
            max_syntax_errors: 32,
            max_array_length: 65_536,
        }
    }
}

impl RunConfig {
    pub fn with_max_loop_iterations(mut self, max: usize) -> Self {
        self.max_loop_iterations = max;
        self
    }

    pub fn with_max_call_depth(mut self, max: usize) -> Self {
        self.max_call_depth = max;
        self
    }

    /// Stack size for the thread that runs a program, large enough that
    /// `max_call_depth` nested calls hit the depth check before they
    /// exhaust native stack.
    pub fn stack_size(&self) -> usize {
        BASE_STACK.saturating_add(self.max_call_depth.saturating_mul(STACK_PER_CALL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_grows_with_call_depth() {
        let shallow = RunConfig::default().with_max_call_depth(1);
        let deep = RunConfig::default().with_max_call_depth(1_000);
        assert!(deep.stack_size() > shallow.stack_size());
        assert_eq!(
            RunConfig::default().with_max_call_depth(usize::MAX).stack_size(),
            usize::MAX
        );
    }
}
