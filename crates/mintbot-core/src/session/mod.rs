//! Session storage and the input-collection state machine.

pub mod machine;
pub mod store;

pub use machine::{Input, SessionMachine, Transition};
pub use store::{SessionGuard, SessionStore};
