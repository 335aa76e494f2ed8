//! The distribution engine: stream fan-out, subscriber registry,
//! read-through fetch, and the heartbeat watchdog.

mod engine;
mod registry;
mod watchdog;

pub use engine::DistributionEngine;
pub use registry::SubscriberRegistry;
pub use registry::SubscriberSession;
pub use watchdog::spawn_watchdog;

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod registry_test;
#[cfg(test)]
mod watchdog_test;
