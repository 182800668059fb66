//! Init/close lifecycle shared by the config store and analytics.

use std::sync::Arc;

/// A collaborator that must be opened before use and closed exactly once.
pub trait Subsystem: Send + Sync {
    /// Short name used in log events
    fn name(&self) -> &'static str;

    fn init(&self) -> anyhow::Result<()>;

    fn close(&self) -> anyhow::Result<()>;
}

/// Scoped handle returned by [`open`]; closes the subsystem when dropped.
///
/// The bootstrapper returns its errors instead of exiting in place, so the
/// guard runs on every path out of `serve`, fatal ones included.
pub struct Opened<S: Subsystem + ?Sized> {
    inner: Arc<S>,
}

/// Initialize `subsystem` and hand back the guard that will close it.
pub fn open<S: Subsystem + ?Sized>(subsystem: Arc<S>) -> anyhow::Result<Opened<S>> {
    subsystem.init()?;
    tracing::info!(subsystem = subsystem.name(), "Initialized");
    Ok(Opened { inner: subsystem })
}

impl<S: Subsystem + ?Sized> Opened<S> {
    pub fn get(&self) -> &Arc<S> {
        &self.inner
    }
}

impl<S: Subsystem + ?Sized> Drop for Opened<S> {
    fn drop(&mut self) {
        match self.inner.close() {
            Ok(()) => tracing::info!(subsystem = self.inner.name(), "Closed"),
            Err(e) => tracing::warn!(subsystem = self.inner.name(), "Failed to close: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        inits: AtomicUsize,
        closes: AtomicUsize,
        fail_init: bool,
    }

    impl Subsystem for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn init(&self) -> anyhow::Result<()> {
            if self.fail_init {
                anyhow::bail!("init refused");
            }
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> anyhow::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_guard_closes_once_on_drop() {
        let subsystem = Arc::new(Counting::default());
        let guard = open(subsystem.clone()).unwrap();
        assert_eq!(subsystem.inits.load(Ordering::SeqCst), 1);
        assert_eq!(subsystem.closes.load(Ordering::SeqCst), 0);

        drop(guard);
        assert_eq!(subsystem.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_init_is_never_closed() {
        let subsystem = Arc::new(Counting {
            fail_init: true,
            ..Counting::default()
        });

        assert!(open(subsystem.clone()).is_err());
        assert_eq!(subsystem.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_guard_over_trait_object() {
        let subsystem = Arc::new(Counting::default());
        let as_dyn: Arc<dyn Subsystem> = subsystem.clone();
        {
            let guard = open(as_dyn).unwrap();
            assert_eq!(guard.get().name(), "counting");
        }
        assert_eq!(subsystem.closes.load(Ordering::SeqCst), 1);
    }
}
