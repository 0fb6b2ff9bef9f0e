//! Keyed change fanout
//!
//! Lets callers subscribe to a logical id (a tree id) and delivers every
//! [`ChangeEvent`] emitted for that id to each current subscriber.
//!
//! ```text
//! ┌──────────────┐
//! │ TreeRegistry │ mutation finished, tree lock released
//! └──────┬───────┘
//!        │ emit(tree_id, modified keys)
//!        ▼
//! ┌──────────────────┐
//! │ DashMap lookup   │ subscribers of tree_id
//! └──────┬───────────┘
//!        │ try_send per subscriber (never blocks)
//!        ▼
//! ┌──────────────────┐
//! │ Per-subscriber   │ (tokio mpsc, bounded)
//! │ channels         │
//! └──────────────────┘
//! ```
//!
//! # Overflow policy
//!
//! Each subscriber owns a bounded channel of
//! [`FanoutConfig::subscriber_buffer_size`](crate::FanoutConfig) events.
//! When it is full the newest event is dropped for that subscriber only and
//! its dropped counter goes up. A stalled subscriber never blocks other
//! subscribers or the mutating caller; it should re-read the tree if it sees
//! [`Subscription::dropped_events`] grow.
//!
//! # Cancellation
//!
//! Unsubscribing (explicitly, or by dropping the [`Subscription`] /
//! [`SubscriptionGuard`]) removes the sender from the table under the same
//! shard lock `emit` uses, so no delivery is attempted afterwards. Events
//! already queued can still be drained, then the receiver reports the end of
//! the stream.

mod change_fanout;

#[cfg(test)]
mod change_fanout_test;

pub use change_fanout::*;
