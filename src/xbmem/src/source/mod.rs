//! Memory Source Abstraction
//!
//! Core abstractions for reading console memory:
//! - `MemorySource` trait implemented by live transports and snapshot files
//! - `MemoryRegion` describing an address window backed by a source
//! - Mock sources for testing

mod region;
mod traits;

#[cfg(test)]
mod mock;

pub use region::MemoryRegion;
pub use traits::MemorySource;

#[cfg(test)]
pub use mock::MockMemorySource;
