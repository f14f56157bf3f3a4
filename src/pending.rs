//! Handles for deferred values in flight.
//!
//! Pushing a [`Deferred`](crate::value::Deferred) spawns a local task that
//! awaits the value and applies it. The task runs on the current
//! [`tokio::task::LocalSet`]; a [`Pending`] resolves once the value (and any
//! deferred values it pushed in turn) has been applied.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::BindError;

/// A deferred value being applied under a placeholder name.
pub struct Pending {
    name: String,
    handle: JoinHandle<()>,
}

impl Pending {
    /// Spawn `task` on the current `LocalSet`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `LocalSet`.
    pub(crate) fn spawn(name: &str, task: impl Future<Output = ()> + 'static) -> Self {
        Self {
            name: name.to_owned(),
            handle: tokio::task::spawn_local(task),
        }
    }

    /// The placeholder name the value is pushed to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the value has been applied.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for Pending {
    type Output = Result<(), BindError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.handle)
            .poll(cx)
            .map(|joined| joined.map_err(|_| BindError::Deferred(this.name.clone())))
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Await every pending value, returning the first failure.
pub async fn settle(pending: impl IntoIterator<Item = Pending>) -> Result<(), BindError> {
    let mut first_error = None;
    for item in pending {
        if let Err(err) = item.await {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test]
    async fn pending_resolves_after_task() {
        let local = LocalSet::new();
        let flag = Rc::new(Cell::new(false));
        let seen = flag.clone();
        local
            .run_until(async move {
                let pending = Pending::spawn("x", async move { seen.set(true) });
                assert_eq!(pending.name(), "x");
                pending.await.unwrap();
            })
            .await;
        assert!(flag.get());
    }

    #[tokio::test]
    async fn pending_stays_pending_until_value_arrives() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let (tx, rx) = tokio::sync::oneshot::channel::<()>();
                let pending = Pending::spawn("late", async move {
                    let _ = rx.await;
                });
                let mut task = tokio_test::task::spawn(pending);
                tokio_test::assert_pending!(task.poll());

                tx.send(()).unwrap();
                while !task.is_woken() {
                    tokio::task::yield_now().await;
                }
                tokio_test::assert_ready_ok!(task.poll());
            })
            .await;
    }

    #[tokio::test]
    async fn settle_reports_panicked_task() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let ok = Pending::spawn("ok", async {});
                let bad = Pending::spawn("bad", async { panic!("boom") });
                let result = settle([ok, bad]).await;
                assert_eq!(result, Err(BindError::Deferred("bad".into())));
            })
            .await;
    }
}
