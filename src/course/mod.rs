//! Course content: the topic catalog and the event-loop walkthrough.

pub mod event_loop;
pub mod topics;

pub use event_loop::{Player, Step, STEPS};
pub use topics::Topic;
