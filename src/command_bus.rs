use crate::delivery::{guarded, spawn};
use crate::singleton::Singleton;
use crate::{Command, Context, Delivery};

static COMMAND_BUS: Singleton<CommandBus> = Singleton::new(CommandBus::new);

/// Executes [commands](Command).
///
/// Every command is executed inside a guard that intercepts panics: a panicking command results in
/// an [Error::Panicked](crate::Error::Panicked), converted into the command's error type, instead
/// of unwinding into the caller. This holds for the three execution modes:
///
/// * [execute()](CommandBus::execute) runs the command on the caller's task;
/// * [execute_async()](CommandBus::execute_async) runs the command on a new Tokio task and returns
///   a [Delivery] of its result;
/// * [execute_async_await()](CommandBus::execute_async_await) runs the command on a new Tokio task
///   and waits for its result.
///
/// The bus holds no state. The process-wide instance is available through
/// [global()](CommandBus::global) or [command_bus()](crate::command_bus), but a bus can also be
/// created with [new()](CommandBus::new) or the [Default] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandBus {
    _private: (),
}

impl CommandBus {
    /// Creates a new [CommandBus].
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Returns the process-wide [CommandBus], creating it on first access.
    pub fn global() -> &'static Self {
        COMMAND_BUS.get()
    }

    /// Executes a command on the caller's task and returns its result.
    pub async fn execute<C>(&self, context: &Context, command: &C) -> Result<(), C::Error>
    where
        C: Command,
    {
        let name = command.name();
        log::trace!("Executing command {name}");
        guarded(name, command.execute(context)).await
    }

    /// Executes a command on a new Tokio task. The returned [Delivery] receives the result of the
    /// command once it completes.
    ///
    /// The task is not aborted if the context is canceled: honoring cancellation is up to the
    /// command.
    pub fn execute_async<C>(&self, context: &Context, command: C) -> Delivery<Result<(), C::Error>>
    where
        C: Command,
    {
        let name = command.name();
        log::trace!("Executing command {name} in the background");
        let context = context.clone();
        spawn(
            name,
            async move { guarded(name, command.execute(&context)).await },
            |error| Err(C::Error::from(error)),
        )
    }

    /// Executes a command on a new Tokio task and waits for its result.
    ///
    /// Equivalent to receiving from the [Delivery] returned by
    /// [execute_async()](CommandBus::execute_async).
    pub async fn execute_async_await<C>(&self, context: &Context, command: C) -> Result<(), C::Error>
    where
        C: Command,
    {
        self.execute_async(context, command)
            .settle(|error| Err(C::Error::from(error)))
            .await
    }
}
