//! Generation-tagged dispatch of loader results.
//!
//! Each loader registers with a [`Dispatcher`] and gets a [`LoaderHandle`].
//! Work the loader starts carries that handle; when the loader goes away its
//! slot's generation moves on, and anything still in flight finds the handle
//! stale and drops its result instead of delivering it.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Identity of one registered loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderHandle {
    slot: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    live: bool,
}

#[derive(Debug, Default)]
struct Slots {
    entries: Vec<Slot>,
    free: Vec<usize>,
}

/// Arena of loader identities.
#[derive(Debug, Default)]
pub struct Dispatcher {
    slots: Mutex<Slots>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // Slot bookkeeping is two integer writes; a poisoned guard is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand out a fresh handle, reusing a released slot when one exists.
    pub fn register(&self) -> LoaderHandle {
        let mut slots = self.slots();
        match slots.free.pop() {
            Some(index) => {
                let slot = &mut slots.entries[index];
                slot.live = true;
                LoaderHandle {
                    slot: index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = slots.entries.len();
                slots.entries.push(Slot {
                    generation: 0,
                    live: true,
                });
                LoaderHandle {
                    slot: index,
                    generation: 0,
                }
            }
        }
    }

    /// Invalidate `handle`. Returns `false` if it was already stale.
    pub fn release(&self, handle: LoaderHandle) -> bool {
        let mut slots = self.slots();
        let released = match slots.entries.get_mut(handle.slot) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                slot.live = false;
                slot.generation += 1;
                true
            }
            _ => false,
        };
        if released {
            slots.free.push(handle.slot);
        }
        released
    }

    pub fn is_live(&self, handle: LoaderHandle) -> bool {
        Self::live_in(&self.slots(), handle)
    }

    /// Number of currently registered loaders.
    pub fn live_count(&self) -> usize {
        self.slots().entries.iter().filter(|slot| slot.live).count()
    }

    /// Run `f` only if `handle` is live, holding the arena lock so a
    /// concurrent release cannot slip in between the check and `f`.
    fn with_live<R>(&self, handle: LoaderHandle, f: impl FnOnce() -> R) -> Option<R> {
        let slots = self.slots();
        Self::live_in(&slots, handle).then(f)
    }

    fn live_in(slots: &Slots, handle: LoaderHandle) -> bool {
        slots
            .entries
            .get(handle.slot)
            .is_some_and(|slot| slot.live && slot.generation == handle.generation)
    }
}

/// The eventual result of a loader operation.
///
/// Resolves to `Some(result)` exactly once, or to `None` when the loader
/// that started the operation was released before the result arrived.
/// Dropping a `Delivery` does not stop the operation.
#[derive(Debug)]
#[must_use = "the operation runs regardless; drop the delivery explicitly to ignore it"]
pub struct Delivery<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for Delivery<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}

/// Sending side of a [`Delivery`], bound to the handle of the loader that
/// created it.
#[derive(Debug)]
pub(crate) struct Deliverer<T> {
    sender: oneshot::Sender<T>,
    dispatcher: Arc<Dispatcher>,
    handle: LoaderHandle,
}

impl<T> Deliverer<T> {
    pub(crate) fn channel(dispatcher: Arc<Dispatcher>, handle: LoaderHandle) -> (Self, Delivery<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender,
                dispatcher,
                handle,
            },
            Delivery { receiver },
        )
    }

    pub(crate) fn is_live(&self) -> bool {
        self.dispatcher.is_live(self.handle)
    }

    /// Deliver `value` if the owning loader is still registered.
    pub(crate) fn deliver(self, value: T) -> bool {
        let Self {
            sender,
            dispatcher,
            handle,
        } = self;
        match dispatcher.with_live(handle, move || sender.send(value).is_ok()) {
            Some(delivered) => delivered,
            None => {
                tracing::trace!(?handle, "Loader released; dropping late result");
                false
            }
        }
    }
}
