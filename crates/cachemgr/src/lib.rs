//! Top-level facade crate for cachemgr.
//!
//! Re-exports the protocol core and the exporter library so users can depend on a single crate.

pub mod core {
    pub use cachemgr_core::*;
}

pub mod exporter {
    pub use cachemgr_exporter::*;
}
