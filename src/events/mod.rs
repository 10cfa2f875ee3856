//! # Events Module
//!
//! Channel-based progress reporting.
//!
//! ## Design
//! A run pushes typed events into a crossbeam channel; the caller drains
//! the receiver on its own thread or event loop. Progress is a single
//! 0-100 scale shared by both phases, throttled to one event per percent.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Progress(p) => println!("{}% ({})", p.percent, p.phase),
//!             Event::Cluster(ClusterEvent::PairMatched { path_a, path_b, distance }) => {
//!                 println!("{} ~ {} ({})", path_a.display(), path_b.display(), distance)
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! finder.run_with_events(&candidates, &token, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
