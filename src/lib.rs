//! Live keyword filtering over a growing console log.
//!
//! The core mirrors an append-only text stream ([`LogBuffer`]), filters it
//! line by line ([`FilterExpression`]) and pushes the result into a host
//! display ([`DisplaySurface`]) while keeping the view pinned to the tail
//! only when the user was already looking at it ([`ViewSync`]).
//! [`LogView`] ties these together and owns their lifetimes.

pub mod buffer;
pub mod config;
pub mod filter;
pub mod subscription;
pub mod surface;
pub mod sync;
pub mod view;

pub use buffer::LogBuffer;
pub use config::{Config, ViewConfig};
pub use filter::{FilterExpression, filter};
pub use subscription::Subscription;
pub use surface::{DisplaySurface, ScrollMetrics};
pub use sync::{SyncOutcome, ViewSync};
pub use view::{ChangeSignal, Feed, LogView};
