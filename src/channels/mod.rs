//! Event channels: named publish/subscribe broadcast points.
//!
//! Channels decouple whatever raises an event (usually a trigger's raise
//! action) from whatever reacts to it (listeners, or any closure). Neither
//! side owns the other: subscribers hold an `Rc` to the channel, the channel
//! holds only the handlers it was given, and a subscription lives until its
//! [`SubscriptionHandle`] is passed back to `unsubscribe`.
//!
//! ## Dispatch rules
//!
//! - Handlers run synchronously, in subscription order, on the raiser's stack.
//! - An inactive channel drops raises without calling anyone.
//! - A raise iterates a snapshot; handlers removed mid-raise are skipped,
//!   handlers added mid-raise first run on the next raise.
//! - A failing or panicking handler is logged and counted; the rest still run.
//! - Nested raises are bounded by a per-thread depth limit.
//!
//! ## Example Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use rust_triggers::channels::{RaiseOutcome, VoidChannel};
//!
//! let door = VoidChannel::new("Door").shared();
//! let opened = Rc::new(Cell::new(0));
//!
//! let counter = Rc::clone(&opened);
//! let handle = door.subscribe(move |_| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! assert_eq!(door.raise_void(), RaiseOutcome::Delivered { delivered: 1, failed: 0 });
//! assert_eq!(opened.get(), 1);
//!
//! door.unsubscribe(handle);
//! door.raise_void();
//! assert_eq!(opened.get(), 1);
//! assert_eq!(door.raised_count(), 2);
//! ```

mod channel;
mod dispatch;
mod handle;
mod registry;

pub use channel::{EventChannel, RaiseOutcome, VoidChannel};
pub use dispatch::{current_depth, DEFAULT_MAX_DISPATCH_DEPTH};
pub use handle::{ChannelId, SubscriptionHandle};
pub use registry::{ChannelRegistry, ConfiguredChannel};
