//! Operation handoff between the layout context and the UI context, backed by
//! `std` synchronization primitives.
//!
//! The layout side flushes hierarchy passes into an [`OperationSender`]; each
//! flush becomes one batch. The UI side holds an [`OperationChannel`] and
//! drains whole batches, oldest first, into whatever consumer owns the native
//! views. A registered frame waker is invoked once per delivered batch.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use flat_core::{ViewOperation, ViewOperationConsumer};

type FrameWaker = Arc<dyn Fn() + Send + Sync + 'static>;

struct Shared {
    batches: Mutex<VecDeque<Vec<ViewOperation>>>,
    frame_requested: AtomicBool,
    frame_waker: RwLock<Option<FrameWaker>>,
}

impl Shared {
    fn push(&self, batch: Vec<ViewOperation>) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(batch);
        self.frame_requested.store(true, Ordering::SeqCst);
        let waker = self
            .frame_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

/// UI-side handle. Cheap to clone.
#[derive(Clone)]
pub struct OperationChannel {
    shared: Arc<Shared>,
}

impl OperationChannel {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                batches: Mutex::new(VecDeque::new()),
                frame_requested: AtomicBool::new(false),
                frame_waker: RwLock::new(None),
            }),
        }
    }

    /// Layout-side consumer feeding this channel. Operations are buffered
    /// until the pass that produced them is flushed.
    pub fn sender(&self) -> OperationSender {
        OperationSender {
            shared: Arc::clone(&self.shared),
            current: Vec::new(),
        }
    }

    /// Returns whether a batch arrived since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.shared.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a batch is delivered.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .shared
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_frame_waker(&self) {
        *self
            .shared
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn pending_batches(&self) -> usize {
        self.shared
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Executes every delivered batch on `consumer` in order, closing each
    /// with `batch_flushed`. Returns the number of executed operations.
    pub fn drain_into(&self, consumer: &mut dyn ViewOperationConsumer) -> usize {
        let batches = std::mem::take(
            &mut *self
                .shared
                .batches
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut executed = 0;
        for batch in batches {
            executed += batch.len();
            for operation in batch {
                consumer.execute(operation);
            }
            consumer.batch_flushed();
        }
        if executed > 0 {
            log::trace!("executed {executed} view operations on the UI context");
        }
        executed
    }
}

impl Default for OperationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationChannel")
            .field("pending_batches", &self.pending_batches())
            .field(
                "frame_requested",
                &self.shared.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

/// Layout-side end of an [`OperationChannel`].
pub struct OperationSender {
    shared: Arc<Shared>,
    current: Vec<ViewOperation>,
}

impl ViewOperationConsumer for OperationSender {
    fn execute(&mut self, operation: ViewOperation) {
        self.current.push(operation);
    }

    fn batch_flushed(&mut self) {
        self.shared.push(std::mem::take(&mut self.current));
    }
}

impl fmt::Debug for OperationSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSender")
            .field("buffered", &self.current.len())
            .finish()
    }
}
