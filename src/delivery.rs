use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

pub use tokio::sync::oneshot::error::TryRecvError;

use crate::{recover_to_error, Error};

/// Receives the single result of a dispatchable running in the background.
///
/// A delivery yields exactly one value. Once that value has been received, the delivery is closed:
/// [recv()](Delivery::recv) returns `None` immediately instead of waiting for another value.
#[derive(Debug)]
pub struct Delivery<T> {
    name: &'static str,
    receiver: Option<oneshot::Receiver<T>>,
}

impl<T> Delivery<T> {
    fn new(name: &'static str, receiver: oneshot::Receiver<T>) -> Self {
        Self {
            name,
            receiver: Some(receiver),
        }
    }

    /// The name of the dispatchable whose result is delivered.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the delivered value.
    ///
    /// Returns `None` if the value has already been received, or if the background task was
    /// dropped before delivering it. This method is cancel safe.
    pub async fn recv(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;
        let value = receiver.await.ok();
        self.receiver = None;
        value
    }

    /// Receives the delivered value if it is already available, without waiting.
    ///
    /// Fails with [TryRecvError::Empty] while the dispatchable is still running, and with
    /// [TryRecvError::Closed] once the value has been received or if it will never arrive.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        let receiver = self.receiver.as_mut().ok_or(TryRecvError::Closed)?;
        match receiver.try_recv() {
            Err(TryRecvError::Empty) => Err(TryRecvError::Empty),
            result => {
                self.receiver = None;
                result
            }
        }
    }

    /// Whether the delivery is closed, meaning no value will ever be received from it again.
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }

    /// Waits for the delivered value, turning a missing value into [Error::Abandoned].
    pub(crate) async fn settle(mut self, abandoned: impl FnOnce(Error) -> T) -> T {
        let name = self.name;
        match self.recv().await {
            Some(value) => value,
            None => abandoned(Error::Abandoned(name)),
        }
    }
}

/// Runs a dispatchable future, converting a panic into an error of the dispatchable's error type.
pub(crate) async fn guarded<F, T, E>(name: &'static str, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    let mut result = None;
    let fault = AssertUnwindSafe(async { result = Some(future.await) })
        .catch_unwind()
        .await
        .err();
    match (recover_to_error(name, fault), result) {
        (Some(error), _) => {
            log::warn!("Intercepted a panic: {error}");
            Err(error.into())
        }
        (None, Some(result)) => result,
        (None, None) => Err(Error::Abandoned(name).into()),
    }
}

/// Spawns `future` on the current Tokio runtime and returns the [Delivery] of its output.
///
/// When no runtime is running, `future` is dropped and the delivery resolves immediately with the
/// output built by `no_runtime`.
pub(crate) fn spawn<F, O>(
    name: &'static str,
    future: F,
    no_runtime: impl FnOnce(Error) -> O,
) -> Delivery<O>
where
    F: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if sender.send(future.await).is_err() {
                    log::debug!("The result of {name} was not delivered: the receiver is gone");
                }
            });
        }
        Err(_) => {
            let error = Error::NoRuntime(name);
            log::warn!("{error}");
            if sender.send(no_runtime(error)).is_err() {
                log::debug!("The result of {name} was not delivered: the receiver is gone");
            }
        }
    }
    Delivery::new(name, receiver)
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("failure")]
        Failure,
        #[error(transparent)]
        Bus(#[from] Error),
    }

    #[tokio::test]
    async fn delivery_yields_one_value_then_closes() {
        let mut delivery = spawn("answer", async { 42 }, |_| 0);

        assert_eq!(delivery.recv().await, Some(42));
        assert!(delivery.is_terminated());
        assert_eq!(delivery.recv().await, None);
        assert_eq!(delivery.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn try_recv_is_empty_while_running() {
        let (release, wait) = oneshot::channel::<()>();
        let mut delivery = spawn(
            "blocked",
            async move {
                let _ = wait.await;
                7
            },
            |_| 0,
        );

        assert_eq!(delivery.try_recv(), Err(TryRecvError::Empty));
        assert!(!delivery.is_terminated());

        release.send(()).unwrap();
        assert_eq!(delivery.recv().await, Some(7));
    }

    #[tokio::test]
    async fn guarded_passes_results_through() {
        let ok: Result<u8, TestError> = guarded("ok", async { Ok(1) }).await;
        let failure: Result<u8, TestError> = guarded("ko", async { Err(TestError::Failure) }).await;

        assert_eq!(ok.unwrap(), 1);
        assert!(matches!(failure, Err(TestError::Failure)));
    }

    #[tokio::test]
    async fn guarded_converts_panics() {
        let result: Result<(), TestError> = guarded("boom", async { panic!("boom") }).await;

        assert!(matches!(
            result,
            Err(TestError::Bus(Error::Panicked { name: "boom", ref message })) if message == "boom"
        ));
    }

    #[tokio::test]
    async fn guarded_describes_non_string_panics() {
        let result: Result<(), TestError> =
            guarded("opaque", async { std::panic::panic_any(7_u32) }).await;

        assert!(matches!(
            result,
            Err(TestError::Bus(Error::Panicked { name: "opaque", ref message }))
                if message == "panic payload is not a string"
        ));
    }

    #[test]
    fn spawning_without_runtime_delivers_an_error() {
        let mut delivery = spawn(
            "orphan",
            async { Ok::<_, TestError>(()) },
            |error| Err(TestError::from(error)),
        );

        assert!(matches!(
            delivery.try_recv(),
            Ok(Err(TestError::Bus(Error::NoRuntime("orphan"))))
        ));
        assert_eq!(tokio_test::block_on(delivery.recv()).map(|_| ()), None);
    }

    #[test]
    fn dropped_task_settles_as_abandoned() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let delivery = runtime.block_on(async {
            spawn(
                "forever",
                std::future::pending::<Result<(), TestError>>(),
                |error| Err(TestError::from(error)),
            )
        });
        drop(runtime);

        let result = tokio_test::block_on(delivery.settle(|error| Err(TestError::from(error))));

        assert!(matches!(
            result,
            Err(TestError::Bus(Error::Abandoned("forever")))
        ));
    }
}
