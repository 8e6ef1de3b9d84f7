//! Domain services.

mod dispatcher;

pub use dispatcher::{DispatchError, OrderDispatcher};
