use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Error;

/// The execution context passed to every [command](crate::Command), [query](crate::Query) and
/// [event](crate::Event).
///
/// A context carries a cancellation signal, an optional deadline, and typed values. Contexts form
/// a tree: deriving a context with [with_cancel()](Context::with_cancel),
/// [with_deadline()](Context::with_deadline) or [with_value()](Context::with_value) creates a
/// child that sees everything its parent carries. Cancelling a context cancels all of its
/// descendants.
///
/// The buses never look inside the context; honoring cancellation is up to the dispatchables.
///
/// Cloning a context is cheap.
///
/// # Example
///
/// ```
/// # use mediatr::{Context, ContextError};
/// struct UserId(u64);
///
/// let (context, cancel) = Context::background()
///     .with_value(UserId(7))
///     .with_cancel();
///
/// assert_eq!(context.value::<UserId>().map(|id| id.0), Some(7));
///
/// cancel.cancel();
/// assert_eq!(context.err(), Some(ContextError::Canceled));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    parent: Option<Context>,
    token: CancellationToken,
    deadline: Option<Instant>,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

/// The reason why a [Context] is done.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, thiserror::Error)]
pub enum ContextError {
    /// The context, or one of its ancestors, was canceled.
    #[error("context canceled")]
    Canceled,
    /// The deadline of the context has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancels the [Context] it was created with, along with all of its descendants.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancels the associated context. Cancelling more than once has no effect.
    pub fn cancel(&self) {
        self.token.cancel()
    }

    /// Whether the associated context has been canceled, either by this handle or by one of its
    /// ancestors.
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Context {
    /// Creates an empty root context. It is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that can be canceled with the returned [CancelHandle].
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        self.derive(self.inner.deadline)
    }

    /// Derives a context that is done once `deadline` has passed. If this context already has an
    /// earlier deadline, the earlier one is kept.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
        let deadline = match self.inner.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        self.derive(Some(deadline))
    }

    /// Derives a context that is done once `timeout` has elapsed from now.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context carrying `value`. The value can be retrieved by type with
    /// [value()](Context::value), from this context and from all of its descendants.
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                token: self.inner.token.clone(),
                deadline: self.inner.deadline,
                value: Some(Arc::new(value)),
            }),
        }
    }

    /// Returns the nearest value of type `T` carried by this context or one of its ancestors.
    pub fn value<T: Any>(&self) -> Option<&T> {
        let mut context = self;
        loop {
            if let Some(value) = context
                .inner
                .value
                .as_ref()
                .and_then(|value| value.downcast_ref::<T>())
            {
                return Some(value);
            }
            context = context.inner.parent.as_ref()?;
        }
    }

    /// The deadline of the context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns why the context is done, or `None` if it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.inner.token.is_cancelled() {
            Some(ContextError::Canceled)
        } else if self
            .inner
            .deadline
            .is_some_and(|deadline| deadline <= Instant::now())
        {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Whether the context has been canceled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Fails with [Error::Context] if the context is done. Meant to be used with `?` inside
    /// dispatchables.
    pub fn check(&self) -> Result<(), Error> {
        match self.err() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Waits until the context is done and returns why.
    ///
    /// Never completes for a context that has no deadline and is never canceled.
    pub async fn done(&self) -> ContextError {
        let token = &self.inner.token;
        match self.inner.deadline {
            Some(deadline) => tokio::select! {
                _ = token.cancelled() => ContextError::Canceled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                token.cancelled().await;
                ContextError::Canceled
            }
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> (Self, CancelHandle) {
        let token = self.inner.token.child_token();
        let context = Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                token: token.clone(),
                deadline,
                value: None,
            }),
        };
        (context, CancelHandle { token })
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct RequestId(&'static str);

    #[test]
    fn background_context_is_never_done() {
        let context = Context::background();

        assert_eq!(context.err(), None);
        assert!(context.deadline().is_none());
        assert!(context.check().is_ok());
    }

    #[test]
    fn values_are_inherited_and_shadowed() {
        let parent = Context::background().with_value(RequestId("parent"));
        let (child, _) = parent.with_cancel();
        let shadowed = child.with_value(RequestId("child"));

        assert_eq!(child.value::<RequestId>().map(|id| id.0), Some("parent"));
        assert_eq!(shadowed.value::<RequestId>().map(|id| id.0), Some("child"));
        assert_eq!(parent.value::<RequestId>().map(|id| id.0), Some("parent"));
        assert!(parent.value::<u32>().is_none());
    }

    #[test]
    fn cancelling_a_parent_cancels_its_descendants() {
        let (parent, cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();
        let grandchild = child.with_value(1_u8);

        cancel.cancel();

        assert_eq!(grandchild.err(), Some(ContextError::Canceled));
        assert!(child_cancel.is_canceled());
        assert!(matches!(
            grandchild.check(),
            Err(Error::Context(ContextError::Canceled))
        ));
    }

    #[test]
    fn cancelling_a_child_leaves_its_parent_alone() {
        let (parent, _cancel) = Context::background().with_cancel();
        let (child, child_cancel) = parent.with_cancel();

        child_cancel.cancel();

        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn earliest_deadline_wins() {
        let (parent, _) = Context::background().with_timeout(Duration::from_secs(1));
        let (child, _) = parent.with_timeout(Duration::from_secs(10));

        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_completes_done() {
        let (context, _cancel) = Context::background().with_timeout(Duration::from_millis(50));

        assert_eq!(context.err(), None);
        assert_eq!(context.done().await, ContextError::DeadlineExceeded);
        assert_eq!(context.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancellation_completes_done() {
        let (context, cancel) = Context::background().with_cancel();

        let waiter = tokio::spawn({
            let context = context.clone();
            async move { context.done().await }
        });
        cancel.cancel();

        assert!(matches!(waiter.await, Ok(ContextError::Canceled)));
    }
}
