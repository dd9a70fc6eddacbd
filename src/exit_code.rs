use std::cell::Cell;

/// Tracks the process exit status across a traversal.
///
/// `spec.md` §6/§7: exit codes are `0` on success, `1` on any reported
/// failure, or `n` when `-exit n` terminates the traversal. Once an explicit
/// `-exit n`/`-quit`-with-status value has been set, later failures must not
/// downgrade it back to the generic `1`.
pub struct ExitStatus {
    code: Cell<i32>,
    explicit: Cell<bool>,
}

impl ExitStatus {
    pub fn new() -> Self {
        ExitStatus {
            code: Cell::new(0),
            explicit: Cell::new(false),
        }
    }

    /// Record a generic failure (stat error, I/O error, ...). Never
    /// overrides an explicit `-exit n` value.
    pub fn mark_failure(&self) {
        if !self.explicit.get() {
            self.code.set(1);
        }
    }

    /// Record the exact code requested by `-exit n`.
    pub fn set_explicit(&self, code: i32) {
        self.code.set(code);
        self.explicit.set(true);
    }

    pub fn get(&self) -> i32 {
        self.code.get()
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(ExitStatus::new().get(), 0);
    }

    #[test]
    fn failure_sets_one() {
        let status = ExitStatus::new();
        status.mark_failure();
        assert_eq!(status.get(), 1);
    }

    #[test]
    fn explicit_exit_wins_over_later_failure() {
        let status = ExitStatus::new();
        status.set_explicit(7);
        status.mark_failure();
        assert_eq!(status.get(), 7);
    }
}
