use proc_macro::TokenStream;

mod arguments;
mod handler;
pub(crate) mod utils;

use handler::Kind;

/// Implements `mediatr::Command` for the type of the second argument of an async function.
///
/// Arguments: `name = "..."` (defaults to the kebab-cased type name) and `error = <Type>`.
///
/// The handler must return a `Result`. Its error type ends up in the public interface of the
/// message type, so it must be at least as visible as the message type. The same applies to
/// queries and events.
#[proc_macro_attribute]
pub fn command(arguments: TokenStream, handler: TokenStream) -> TokenStream {
    handler::handler(Kind::Command, arguments, handler)
}

/// Implements `mediatr::Query` for the type of the second argument of an async function.
///
/// Arguments: `name = "..."`, `error = <Type>` and `output = <Type>`.
#[proc_macro_attribute]
pub fn query(arguments: TokenStream, handler: TokenStream) -> TokenStream {
    handler::handler(Kind::Query, arguments, handler)
}

/// Implements `mediatr::Event` for the type of the second argument of an async function.
#[proc_macro_attribute]
pub fn event(arguments: TokenStream, handler: TokenStream) -> TokenStream {
    handler::handler(Kind::Event, arguments, handler)
}
