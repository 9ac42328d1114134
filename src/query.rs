use async_trait::async_trait;
use std::any::type_name;

use crate::{Context, Error};

/// A request to read from the system.
///
/// A query knows how to answer itself in [handle()](Query::handle). Queries are run through the
/// [QueryBus](crate::QueryBus), which intercepts panics and turns them into errors.
///
/// # Associated types
///
/// * [Output](Self::Output) - the value produced by the query
/// * [Error](Self::Error) - the type of errors returned if the query fails
///
/// # Example
///
/// ```
/// use mediatr::{async_trait, Context, Query};
///
/// pub struct CountTodos;
///
/// #[async_trait]
/// impl Query for CountTodos {
///     type Output = usize;
///     type Error = mediatr::Error;
///
///     async fn handle(&self, _: &Context) -> Result<usize, mediatr::Error> {
///         Ok(3)
///     }
/// }
/// ```
#[async_trait]
pub trait Query: Send + Sync + 'static {
    /// The value produced by the query.
    type Output: Send + 'static;

    /// The type of errors returned if the query fails.
    type Error: From<Error> + Send + 'static;

    /// The name of the query, used in logs and error messages. Defaults to the type name.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Answers the query within the given context.
    async fn handle(&self, context: &Context) -> Result<Self::Output, Self::Error>;
}

/// The outcome of a query run in the background, pairing the produced value with the error.
///
/// Exactly one of [value()](ReplayDto::value) and [error()](ReplayDto::error) is present.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReplayDto<T, E> {
    result: Result<T, E>,
}

impl<T, E> ReplayDto<T, E> {
    /// The value produced by the query, if it succeeded.
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The error returned by the query, if it failed.
    pub fn error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }

    /// Whether the query succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Unwraps the envelope into the query's result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

impl<T, E> From<Result<T, E>> for ReplayDto<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self { result }
    }
}

impl<T, E> From<ReplayDto<T, E>> for Result<T, E> {
    fn from(replay: ReplayDto<T, E>) -> Self {
        replay.result
    }
}
