use async_trait::async_trait;
use std::any::type_name;

use crate::{Context, Error};

/// A request to modify the system.
///
/// A command knows how to execute itself: it holds whatever state it needs and performs the
/// modification in [execute()](Command::execute). Commands are run through the
/// [CommandBus](crate::CommandBus), which intercepts panics and turns them into errors.
///
/// # Associated type
///
/// * [Error](Self::Error) - the type of errors returned if the command fails. It must be
///   constructible from the bus [Error], which is how panics are reported.
///
/// # Example
///
/// ```
/// use mediatr::{async_trait, Command, Context};
/// # #[derive(Debug)]
/// # pub struct AppError;
/// # impl From<mediatr::Error> for AppError { fn from(_: mediatr::Error) -> Self { AppError } }
///
/// pub struct CreateTodo {
///     pub name: String,
/// }
///
/// #[async_trait]
/// impl Command for CreateTodo {
///     type Error = AppError;
///
///     async fn execute(&self, context: &Context) -> Result<(), AppError> {
///         context.check()?;
///         println!("Creating {}", self.name);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// The type of errors returned if the command fails.
    type Error: From<Error> + Send + 'static;

    /// The name of the command, used in logs and error messages. Defaults to the type name.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Executes the command within the given context.
    async fn execute(&self, context: &Context) -> Result<(), Self::Error>;
}
