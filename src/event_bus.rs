use crate::delivery::{guarded, spawn};
use crate::singleton::Singleton;
use crate::{Context, Delivery, Event};

static EVENT_BUS: Singleton<EventBus> = Singleton::new(EventBus::new);

/// Dispatches [events](Event).
///
/// Behaves exactly like the [CommandBus](crate::CommandBus): panics raised while dispatching are
/// converted into [Error::Panicked](crate::Error::Panicked) in every mode, and the bus holds no
/// state. The process-wide instance is available through [global()](EventBus::global) or
/// [event_bus()](crate::event_bus).
#[derive(Debug, Default, Clone, Copy)]
pub struct EventBus {
    _private: (),
}

impl EventBus {
    /// Creates a new [EventBus].
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Returns the process-wide [EventBus], creating it on first access.
    pub fn global() -> &'static Self {
        EVENT_BUS.get()
    }

    /// Dispatches an event on the caller's task and returns its result.
    pub async fn dispatch<T>(&self, context: &Context, event: &T) -> Result<(), T::Error>
    where
        T: Event,
    {
        let name = event.name();
        log::trace!("Dispatching event {name}");
        guarded(name, event.dispatch(context)).await
    }

    /// Dispatches an event on a new Tokio task. The returned [Delivery] receives the result once
    /// the event has been handled.
    pub fn dispatch_async<T>(&self, context: &Context, event: T) -> Delivery<Result<(), T::Error>>
    where
        T: Event,
    {
        let name = event.name();
        log::trace!("Dispatching event {name} in the background");
        let context = context.clone();
        spawn(
            name,
            async move { guarded(name, event.dispatch(&context)).await },
            |error| Err(T::Error::from(error)),
        )
    }

    /// Dispatches an event on a new Tokio task and waits for its result.
    pub async fn dispatch_async_await<T>(&self, context: &Context, event: T) -> Result<(), T::Error>
    where
        T: Event,
    {
        self.dispatch_async(context, event)
            .settle(|error| Err(T::Error::from(error)))
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    enum NotifyError {
        #[error("subscriber is gone, {0} was lost")]
        SubscriberGone(&'static str),
        #[error(transparent)]
        Bus(#[from] Error),
    }

    struct Notified {
        subscriber: mpsc::UnboundedSender<&'static str>,
        message: &'static str,
    }

    #[async_trait]
    impl Event for Notified {
        type Error = NotifyError;

        async fn dispatch(&self, _: &Context) -> Result<(), NotifyError> {
            self.subscriber
                .send(self.message)
                .map_err(|_| NotifyError::SubscriberGone(self.message))
        }
    }

    struct Poisoned;

    #[async_trait]
    impl Event for Poisoned {
        type Error = Error;

        fn name(&self) -> &'static str {
            "poisoned"
        }

        async fn dispatch(&self, _: &Context) -> Result<(), Error> {
            let reading: Option<u8> = None;
            let _value = reading.expect("boom: sensor offline");
            Ok(())
        }
    }

    #[tokio::test]
    async fn events_reach_their_subscriber() {
        let (subscriber, mut received) = mpsc::unbounded_channel();
        let bus = EventBus::new();
        let context = Context::background();

        bus.dispatch(
            &context,
            &Notified {
                subscriber: subscriber.clone(),
                message: "sync",
            },
        )
        .await
        .unwrap();
        bus.dispatch_async_await(
            &context,
            Notified {
                subscriber,
                message: "async",
            },
        )
        .await
        .unwrap();

        assert_eq!(received.recv().await, Some("sync"));
        assert_eq!(received.recv().await, Some("async"));
    }

    #[tokio::test]
    async fn handler_errors_are_returned_verbatim() {
        let (subscriber, received) = mpsc::unbounded_channel();
        drop(received);
        let bus = EventBus::new();
        let context = Context::background();
        let lost = |message| Notified {
            subscriber: subscriber.clone(),
            message,
        };

        let sync = bus.dispatch(&context, &lost("sync")).await;
        let delivered = bus.dispatch_async(&context, lost("delivered")).recv().await;
        let awaited = bus.dispatch_async_await(&context, lost("awaited")).await;

        assert!(matches!(sync, Err(NotifyError::SubscriberGone("sync"))));
        assert!(matches!(
            delivered,
            Some(Err(NotifyError::SubscriberGone("delivered")))
        ));
        assert!(matches!(
            awaited,
            Err(NotifyError::SubscriberGone("awaited"))
        ));
    }

    #[tokio::test]
    async fn panics_are_converted_in_every_mode() {
        let bus = EventBus::new();
        let context = Context::background();

        let results = [
            bus.dispatch(&context, &Poisoned).await,
            bus.dispatch_async(&context, Poisoned).recv().await.unwrap(),
            bus.dispatch_async_await(&context, Poisoned).await,
        ];

        for result in results {
            assert!(matches!(
                result,
                Err(Error::Panicked { name: "poisoned", ref message }) if message.contains("boom")
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatches_each_deliver_once() {
        let (subscriber, mut received) = mpsc::unbounded_channel();
        let bus = EventBus::global();
        let context = Context::background();

        let mut deliveries: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|message| {
                bus.dispatch_async(
                    &context,
                    Notified {
                        subscriber: subscriber.clone(),
                        message,
                    },
                )
            })
            .collect();
        drop(subscriber);

        for delivery in &mut deliveries {
            assert!(matches!(delivery.recv().await, Some(Ok(()))));
            assert!(delivery.recv().await.is_none());
        }

        let mut messages = Vec::new();
        while let Some(message) = received.recv().await {
            messages.push(message);
        }
        messages.sort_unstable();
        assert_eq!(messages, ["a", "b", "c", "d"]);
    }
}
