//! Outbound ports (driven side)

use std::sync::Arc;

use ac_06_validation::ValidatorPool;

/// Port: a worker set the controller can resize
pub trait WorkerScaler: Send + Sync {
    /// Workers currently running
    fn current_workers(&self) -> usize;

    /// Resize; returns the resulting size
    fn scale_to(&self, target: usize) -> usize;
}

impl WorkerScaler for ValidatorPool {
    fn current_workers(&self) -> usize {
        self.active()
    }

    fn scale_to(&self, target: usize) -> usize {
        ValidatorPool::scale_to(self, target)
    }
}

impl<T: WorkerScaler + ?Sized> WorkerScaler for Arc<T> {
    fn current_workers(&self) -> usize {
        (**self).current_workers()
    }

    fn scale_to(&self, target: usize) -> usize {
        (**self).scale_to(target)
    }
}
