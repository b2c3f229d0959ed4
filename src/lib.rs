#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Camera-space lattice deformation.
//!
//! Points are projected into a reference camera's gate, remapped through a 2D
//! control lattice (bilinear or Bezier) and projected back, optionally masked
//! by ellipsoidal influence regions. [`geom`] holds the numerical layer;
//! [`deformer::CameraLatticeDeformer`] wraps it the way a host node drives it.

pub mod deformer;
pub mod geom;

pub use deformer::{CameraLatticeDeformer, DeformerInputs};
pub use geom::{DeformOptions, DeformationDiagnostics, DeformationError, deform_points};

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Install an `env_logger` at debug level (respects `RUST_LOG`).
        ///
        /// Safe to call more than once; later calls are ignored.
        pub fn init_logger() {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("debug"),
            )
            .try_init();
        }
    } else {
        /// No-op when the `debug_logs` feature is disabled.
        pub fn init_logger() {}
    }
}
