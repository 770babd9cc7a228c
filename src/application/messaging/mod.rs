//! Message handling - command matching and dispatch

pub mod dispatcher;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use registry::{CommandRegistry, Handler};
