use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle flag shared by a view and everything it spawned.
///
/// Once ended, responses that arrive for the view are dropped on the floor.
#[derive(Debug, Clone)]
pub struct Mount(Arc<AtomicBool>);

impl Mount {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn end(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Mount {
    fn default() -> Self {
        Self::new()
    }
}
