/*!
 * Core Module
 * Shared constants, serde helpers and synchronization primitives
 */

pub mod limits;
pub mod serde;
pub mod sync;

pub use sync::RcuCell;
