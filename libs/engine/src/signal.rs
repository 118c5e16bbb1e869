use tokio::sync::Semaphore;

/// Single-flight gate for sync passes. Holds at most one permit, so a
/// pass triggered while another is running is simply dropped instead of
/// queueing up behind it.
pub struct SyncGate {
    permits: Semaphore,
}

impl SyncGate {
    pub fn new() -> Self {
        Self { permits: Semaphore::new(0) }
    }

    /// Claims the permit if one is available. The caller that gets
    /// `true` owns the in-flight pass and must call [`finish`] when done.
    ///
    /// [`finish`]: SyncGate::finish
    pub fn try_start(&self) -> bool {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Returns the permit. Also used once at startup to prime the gate.
    pub fn finish(&self) {
        self.permits.add_permits(1);
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_pass_runs_at_a_time() {
        let gate = SyncGate::new();
        gate.finish();

        assert!(gate.try_start());
        assert!(!gate.try_start());
        assert!(!gate.try_start());

        gate.finish();
        assert!(gate.try_start());
    }

    #[test]
    fn unprimed_gate_admits_nobody() {
        let gate = SyncGate::new();
        assert!(!gate.try_start());
    }
}
