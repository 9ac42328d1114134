use async_trait::async_trait;
use std::any::type_name;

use crate::{Context, Error};

/// Something that happened in the past.
///
/// Unlike a [Command](crate::Command), an event is not a request: it notifies the system that
/// something already occurred so that it can react in [dispatch()](Event::dispatch). Events are
/// run through the [EventBus](crate::EventBus), which intercepts panics and turns them into errors.
///
/// # Associated type
///
/// * [Error](Self::Error) - the type of errors returned if reacting to the event fails
///
/// # Example
///
/// ```
/// use mediatr::{async_trait, Context, Event};
///
/// pub struct TodoCreated {
///     pub name: String,
/// }
///
/// #[async_trait]
/// impl Event for TodoCreated {
///     type Error = mediatr::Error;
///
///     async fn dispatch(&self, _: &Context) -> Result<(), mediatr::Error> {
///         println!("{} was created", self.name);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Event: Send + Sync + 'static {
    /// The type of errors returned if the event fails.
    type Error: From<Error> + Send + 'static;

    /// The name of the event, used in logs and error messages. Defaults to the type name.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Reacts to the event within the given context.
    async fn dispatch(&self, context: &Context) -> Result<(), Self::Error>;
}
