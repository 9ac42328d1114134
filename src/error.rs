use std::any::Any;

use crate::ContextError;

/// Errors that can be produced by the buses themselves, as opposed to the errors returned by the
/// [commands](crate::Command), [queries](crate::Query) and [events](crate::Event) they run.
///
/// The error type of every dispatchable must implement `From<Error>`, so that these errors can be
/// returned through the same channel as the dispatchable's own errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dispatchable panicked while running. The panic was intercepted by the bus and converted
    /// into this error.
    #[error("{name} panicked: {message}")]
    Panicked {
        /// The name of the dispatchable that panicked.
        name: &'static str,
        /// The panic message, when the payload was a string.
        message: String,
    },
    /// A dispatchable was sent to the background, but no Tokio runtime was running on the calling
    /// thread.
    #[error("Cannot run {0} in the background: no Tokio runtime is running")]
    NoRuntime(&'static str),
    /// The background task running a dispatchable was dropped before it could deliver its result,
    /// usually because the runtime was shut down.
    #[error("{0} was abandoned before delivering its result")]
    Abandoned(&'static str),
    /// The [Context](crate::Context) was canceled or its deadline has passed.
    #[error(transparent)]
    Context(#[from] ContextError),
}

const UNKNOWN_PAYLOAD: &str = "panic payload is not a string";

impl Error {
    /// Builds an [Error::Panicked] from the payload of a panic raised by the dispatchable `name`.
    pub fn from_panic(name: &'static str, payload: Box<dyn Any + Send>) -> Self {
        Error::Panicked {
            name,
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Converts the payload of an intercepted panic into an [Error].
///
/// Returns `None` when there was no panic, so the result can be used directly on the exit path of
/// a guarded call.
///
/// # Example
///
/// ```
/// let payload = std::panic::catch_unwind(|| panic!("boom")).err();
/// let error = mediatr::recover_to_error("my-command", payload).unwrap();
///
/// assert_eq!(error.to_string(), "my-command panicked: boom");
/// assert!(mediatr::recover_to_error("my-command", None).is_none());
/// ```
pub fn recover_to_error(name: &'static str, fault: Option<Box<dyn Any + Send>>) -> Option<Error> {
    fault.map(|payload| Error::from_panic(name, payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNKNOWN_PAYLOAD.to_owned()
    }
}
