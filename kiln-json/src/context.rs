//! Call-scoped mutable state and how calls get hold of it.

use alloc::vec::Vec;

use parking_lot::Mutex;

use crate::guard::CycleGuard;

/// How a serializer or deserializer hands out its per-call [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// One context, reused by every call. Concurrent calls queue on it.
    SingleThreaded,
    /// A context per call, checked out of a small pool and returned after.
    #[default]
    ThreadSafe,
}

/// Scratch state owned by one in-flight call.
#[derive(Debug, Default)]
pub(crate) struct Context {
    /// Decoded strings and number text.
    pub(crate) scratch: Vec<u8>,
    /// Shared records on the current write path.
    pub(crate) guard: CycleGuard,
    /// Length of the last output, used to pre-size the next one.
    pub(crate) output_hint: usize,
}

// Scratch buffers that grew past this are dropped rather than kept around.
const SCRATCH_KEEP: usize = 64 * 1024;

impl Context {
    fn reset(&mut self) {
        self.guard.clear();
        self.scratch.clear();
        if self.scratch.capacity() > SCRATCH_KEEP {
            self.scratch = Vec::new();
        }
    }
}

pub(crate) enum ContextStore {
    Shared(Mutex<Context>),
    Pool {
        idle: Mutex<Vec<Context>>,
        capacity: usize,
    },
}

impl ContextStore {
    pub(crate) fn new(mode: Concurrency, capacity: usize) -> Self {
        match mode {
            Concurrency::SingleThreaded => ContextStore::Shared(Mutex::new(Context::default())),
            Concurrency::ThreadSafe => ContextStore::Pool {
                idle: Mutex::new(Vec::new()),
                capacity,
            },
        }
    }

    pub(crate) fn mode(&self) -> Concurrency {
        match self {
            ContextStore::Shared(_) => Concurrency::SingleThreaded,
            ContextStore::Pool { .. } => Concurrency::ThreadSafe,
        }
    }

    /// Run `f` with exclusive use of a clean context.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        match self {
            ContextStore::Shared(shared) => {
                let mut ctx = shared.lock();
                ctx.reset();
                f(&mut ctx)
            }
            ContextStore::Pool { idle, capacity } => {
                let mut ctx = idle.lock().pop().unwrap_or_default();
                ctx.reset();
                let result = f(&mut ctx);
                let mut idle = idle.lock();
                if idle.len() < *capacity {
                    idle.push(ctx);
                }
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[test]
    fn contexts_come_back_clean() {
        for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
            let store = ContextStore::new(mode, 2);
            assert_eq!(store.mode(), mode);
            store.with(|ctx| {
                ctx.scratch.extend_from_slice(b"left over");
                ctx.guard.enter(1, "Node").unwrap();
            });
            store.with(|ctx| {
                assert!(ctx.scratch.is_empty());
                assert!(ctx.guard.is_empty());
            });
        }
    }

    #[test]
    fn pool_hands_out_distinct_contexts_concurrently() {
        let store = ContextStore::new(Concurrency::ThreadSafe, 4);
        std::thread::scope(|scope| {
            for i in 0..8u8 {
                let store = &store;
                scope.spawn(move || {
                    store.with(|ctx| {
                        ctx.scratch.push(i);
                        std::thread::yield_now();
                        assert_eq!(ctx.scratch, [i]);
                    })
                });
            }
        });
        let ContextStore::Pool { idle, .. } = &store else {
            unreachable!()
        };
        assert!(idle.lock().len() <= 4);
    }
}
