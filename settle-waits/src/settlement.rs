//! The future every primitive hands back.
//!
//! A [`Settlement`] is the receiving end of a one-shot channel. The producing
//! end, [`Settler`], may be cloned into several callbacks (the event listener
//! and the timer of a race); the first `settle` wins and later ones are
//! ignored. When every settler is dropped without settling, the settlement
//! resolves to the error type's [`Abandon::abandoned`] value instead of
//! staying pending on a dead channel.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::FusedFuture;
use parking_lot::Mutex;
use settle_async::sync::oneshot;
use tracing::trace;

use crate::error::Abandon;

/// Creates a connected settler/settlement pair.
pub(crate) fn channel<T, E>() -> (Settler<T, E>, Settlement<T, E>) {
    let (sender, receiver) = oneshot::channel();
    let settler = Settler {
        sender: Arc::new(Mutex::new(Some(sender))),
    };
    let settlement = Settlement {
        receiver,
        terminated: false,
    };
    (settler, settlement)
}

/// Producing half. Cheap to clone; settles at most once across all clones.
pub(crate) struct Settler<T, E> {
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>,
}

impl<T, E> Settler<T, E> {
    /// Delivers `outcome` unless a clone already settled. Returns whether
    /// this call settled.
    pub(crate) fn settle(&self, outcome: Result<T, E>) -> bool {
        let sender = self.sender.lock().take();
        let Some(sender) = sender else {
            return false;
        };
        if sender.send(outcome).is_err() {
            trace!("settlement dropped before it was settled");
        }
        true
    }
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

/// A pending result: resolves with `Ok(T)` or rejects with `Err(E)`.
///
/// Dropping a settlement only discards the result; whatever work produces it
/// keeps running to completion.
#[must_use = "a settlement does nothing unless awaited or polled"]
pub struct Settlement<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
    terminated: bool,
}

impl<T, E: Abandon> Settlement<T, E> {
    /// Returns the outcome if it is already available, without waiting.
    ///
    /// Yields `Some` at most once; afterwards, and while still pending, it
    /// returns `None`.
    pub fn try_settled(&mut self) -> Option<Result<T, E>> {
        if self.terminated {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(E::abandoned()),
        };
        self.terminated = true;
        Some(outcome)
    }
}

impl<T, E> Settlement<T, E> {
    /// Whether the outcome has already been taken out of this settlement.
    /// Once it has, polling stays pending.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T, E: Abandon> Future for Settlement<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if this.terminated {
            return Poll::Pending;
        }
        let outcome = futures::ready!(Pin::new(&mut this.receiver).poll(cx));
        this.terminated = true;
        Poll::Ready(outcome.unwrap_or_else(|_| Err(E::abandoned())))
    }
}

impl<T, E: Abandon> FusedFuture for Settlement<T, E> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T, E> fmt::Debug for Settlement<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlement")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
