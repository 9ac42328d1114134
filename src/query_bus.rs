use crate::delivery::{guarded, spawn};
use crate::singleton::Singleton;
use crate::{Context, Delivery, Query, ReplayDto};

static QUERY_BUS: Singleton<QueryBus> = Singleton::new(QueryBus::new);

/// Handles [queries](Query).
///
/// Like the [CommandBus](crate::CommandBus), every query is handled inside a guard that converts
/// panics into [Error::Panicked](crate::Error::Panicked), whether it runs on the caller's task or
/// in the background. When handled in the background, the outcome of the query is delivered as a
/// [ReplayDto].
///
/// The process-wide instance is available through [global()](QueryBus::global) or
/// [query_bus()](crate::query_bus).
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryBus {
    _private: (),
}

/// The [Delivery] returned when handling a query `Q` in the background.
pub type Replay<Q> = Delivery<ReplayDto<<Q as Query>::Output, <Q as Query>::Error>>;

impl QueryBus {
    /// Creates a new [QueryBus].
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Returns the process-wide [QueryBus], creating it on first access.
    pub fn global() -> &'static Self {
        QUERY_BUS.get()
    }

    /// Handles a query on the caller's task and returns its result.
    pub async fn handle<Q>(&self, context: &Context, query: &Q) -> Result<Q::Output, Q::Error>
    where
        Q: Query,
    {
        let name = query.name();
        log::trace!("Handling query {name}");
        guarded(name, query.handle(context)).await
    }

    /// Handles a query on a new Tokio task. The returned [Delivery] receives a [ReplayDto] with the
    /// outcome of the query once it completes.
    pub fn handle_async<Q>(&self, context: &Context, query: Q) -> Replay<Q>
    where
        Q: Query,
    {
        let name = query.name();
        log::trace!("Handling query {name} in the background");
        let context = context.clone();
        spawn(
            name,
            async move { ReplayDto::from(guarded(name, query.handle(&context)).await) },
            |error| ReplayDto::from(Err(Q::Error::from(error))),
        )
    }

    /// Handles a query on a new Tokio task and waits for its result.
    pub async fn handle_async_await<Q>(
        &self,
        context: &Context,
        query: Q,
    ) -> Result<Q::Output, Q::Error>
    where
        Q: Query,
    {
        self.handle_async(context, query)
            .settle(|error| ReplayDto::from(Err(Q::Error::from(error))))
            .await
            .into_result()
    }
}
