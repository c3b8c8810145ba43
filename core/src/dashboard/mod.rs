//! Interactive dashboard core.
//!
//! The front end owns the terminal and a single loop. Each iteration it
//! feeds one [`Message`] to the [`Dashboard`], hands the returned
//! [`Effect`]s to the [`Executor`], and redraws. Background tasks report
//! back through the same channel, so state is only ever mutated by the loop.

mod executor;
mod state;

pub use executor::Executor;
pub use state::{
    Action, Dashboard, Effect, InfoState, KillState, Message, Screen, SortKey, RESERVED_ROWS,
};
