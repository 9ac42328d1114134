//! # mediatr
//!
//! mediatr is a lightweight in-process mediator. Instead of calling each other directly, the parts
//! of an application send [commands](Command), [queries](Query) and [events](Event) through
//! process-wide buses.
//!
//! ## Concepts
//!
//! A [Command] is a request to modify the system, a [Query] is a request to read from it, and an
//! [Event] notifies the system of something that already happened. Each of them knows how to run
//! itself: mediatr has no handler registry, the message type holds whatever state it needs.
//!
//! ## Buses
//!
//! Each kind of message has its bus: [CommandBus], [QueryBus] and [EventBus]. A bus runs a message
//! in one of three modes:
//!
//! * on the caller's task, e.g. [CommandBus::execute];
//! * on a new Tokio task, returning a [Delivery] that receives the single result, e.g.
//!   [CommandBus::execute_async];
//! * on a new Tokio task, waiting for the result, e.g. [CommandBus::execute_async_await].
//!
//! Whatever the mode, a panic raised by a message never reaches the caller: it is intercepted and
//! returned as an [Error::Panicked], converted into the message's error type.
//!
//! The buses are stateless. A process-wide instance of each is created on first access and can be
//! reached with [command_bus()], [query_bus()] and [event_bus()].
//!
//! ## Context
//!
//! Every message runs within a [Context], which carries cancellation, an optional deadline and
//! typed values. The buses pass it through untouched.
//!
//! ## Features
//!
//! The `derive` feature, which is enabled by default, provides the [command], [query] and [event]
//! attribute macros to implement the message traits from plain async functions.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(__docs, feature(doc_auto_cfg))]

mod command;
mod command_bus;
mod context;
mod delivery;
mod error;
mod event;
mod event_bus;
mod query;
mod query_bus;
mod singleton;

pub use command::Command;
pub use command_bus::CommandBus;
pub use context::{CancelHandle, Context, ContextError};
pub use delivery::{Delivery, TryRecvError};
pub use error::{recover_to_error, Error};
pub use event::Event;
pub use event_bus::EventBus;
pub use query::{Query, ReplayDto};
pub use query_bus::{QueryBus, Replay};
pub use singleton::Singleton;

#[cfg(feature = "derive")]
pub use mediatr_macros::{command, event, query};

pub use async_trait::async_trait;

/// Returns the process-wide [CommandBus].
pub fn command_bus() -> &'static CommandBus {
    CommandBus::global()
}

/// Returns the process-wide [QueryBus].
pub fn query_bus() -> &'static QueryBus {
    QueryBus::global()
}

/// Returns the process-wide [EventBus].
pub fn event_bus() -> &'static EventBus {
    EventBus::global()
}

/// Creates the three process-wide buses.
///
/// The buses are created on first access anyway, so calling this function is optional. It is
/// meant to be called once during startup, and calling it again has no effect.
pub fn init() {
    command_bus();
    query_bus();
    event_bus();
    log::debug!("Command, query and event buses are ready");
}
