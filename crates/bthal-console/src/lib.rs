//! Interactive command dispatch for the Bluetooth HAL socket.
//!
//! A console line is either `<interface> <method> [args...]`,
//! `<interface> [?]` to list an interface's methods, or a top-level
//! command such as `help`, `quit` or `exit`. [`Dispatcher`] resolves the
//! line against a static [`Registry`] and runs the bound handler with a
//! [`Session`].

pub mod builtins;
pub mod complete;
pub mod dispatch;
pub mod error;
pub mod interfaces;
pub mod registry;
pub mod session;

pub use complete::Candidates;
pub use dispatch::{tokenize, Dispatcher, Flow};
pub use error::{DispatchError, HandlerError, HandlerResult, Result};
pub use registry::{find_method, Completer, Handler, Interface, Method, MethodTable, Registry};
pub use session::Session;
