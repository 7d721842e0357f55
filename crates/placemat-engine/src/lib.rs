//! Weighted two-level pseudo-random placement.
//!
//! This crate deterministically maps opaque `u32` keys onto a hierarchy of
//! *migration groups* (MGs), each holding *placement elements* (PEs). A key
//! is placed by two straw2 draws over a Jenkins-derived 32-bit hash: one
//! across the device's MGs, one across the chosen MG's PEs. Because straw2
//! is stable under membership and weight changes, growing or shrinking the
//! topology moves only the keys whose winning draw involved the changed
//! entry.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                    Device                       │
//! │   mg_bucket ── straw2 over MG ids               │
//! ├────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐      │
//! │  │  MG 1    │  │  MG 2    │  │  MG 3    │      │
//! │  │ pe_bucket│  │ pe_bucket│  │ pe_bucket│      │
//! │  └────┬─────┘  └────┬─────┘  └────┬─────┘      │
//! │       │             │             │             │
//! │  ┌────┴─────┐  ┌────┴─────┐  ┌────┴─────┐      │
//! │  │ PE 1..n  │  │ PE 1..n  │  │ PE 1..n  │      │
//! │  │ key sets │  │ key sets │  │ key sets │      │
//! │  └──────────┘  └──────────┘  └──────────┘      │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Topology mutations ([`Device::scale_out_mg`], [`Device::scale_in_mg`],
//! [`Device::scale_up_mg`], [`Device::scale_down_mg`]) clone the device,
//! apply the change, re-select every key stored on the affected PEs under
//! the new topology, and record a migration exactly when a key's
//! destination changed. The prior device is left untouched.
//!
//! # Usage
//!
//! ```
//! use placemat_engine::Device;
//!
//! // Two migration groups, four placement elements of weight 4 each.
//! let mut device = Device::new(2, 4, 4);
//!
//! let key = 0xBEEF;
//! let (mg_id, pe_id) = device.select(key);
//! device.add_data_by_id(mg_id, pe_id, key);
//!
//! // Add a third group; only keys whose draw the new group wins migrate.
//! let scaled = device.scale_out_mg(3, 4, 4).unwrap();
//! assert_eq!(scaled.total(), 1);
//! assert_eq!(scaled.select(key), scaled.locate(key).unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bucket;
pub mod device;
pub mod error;
pub mod hash;
pub mod mg;
pub mod pe;

pub use bucket::{Bucket, Item, NO_SELECTION};
pub use device::Device;
pub use error::{Result, TopologyError};
pub use hash::{hash2, hash3};
pub use mg::Mg;
pub use pe::{MigrateStats, Pe};
