use std::sync::atomic::{AtomicBool, Ordering};

/// Marks programmatic wheel writes so the wheel's change callback does not
/// send them back to the lamp.
#[derive(Debug, Default)]
pub struct Suppression {
    active: AtomicBool,
}

impl Suppression {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Raises the flag until the returned guard is dropped.
    pub fn engage(&self) -> SuppressionGuard<'_> {
        self.active.store(true, Ordering::SeqCst);
        SuppressionGuard { owner: self }
    }
}

#[must_use = "the flag drops back as soon as the guard is dropped"]
pub struct SuppressionGuard<'a> {
    owner: &'a Suppression,
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.owner.active.store(false, Ordering::SeqCst);
    }
}
