use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Allows one export at a time.
///
/// Clones share the same flag. A second `try_acquire` while a ticket is alive
/// returns `None` rather than waiting.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<ExportTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that an export is running; the guard frees up when this drops
#[derive(Debug)]
pub struct ExportTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_ticket_lives() {
        let guard = ExportGuard::new();
        let ticket = guard.try_acquire();
        assert!(ticket.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        assert!(guard.clone().try_acquire().is_none());

        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_ticket_released_on_unwind() {
        let guard = ExportGuard::new();
        let inner = guard.clone();
        let result = std::panic::catch_unwind(move || {
            let _ticket = inner.try_acquire();
            panic!("export blew up");
        });
        assert!(result.is_err());
        assert!(!guard.is_busy());
    }
}
