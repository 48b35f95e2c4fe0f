//! Capability probes for optional native integrations.
//!
//! Presence of OpenColorIO, OpenImageIO, Little CMS and OpenEXR is resolved
//! once into a [`Capabilities`] value that callers pass to the code gated on
//! it. Libraries are only opened to check that they exist; nothing here links
//! against them.
#![allow(unsafe_code)]
// Probing opens shared libraries through libloading.

mod capabilities;
mod capability;
mod error;
mod probe;
mod report;

pub use capabilities::{
    Capabilities, is_littlecms_installed, is_opencolorio_installed, is_openexr_installed, is_openimageio_installed,
    required,
};
pub use capability::Capability;
pub use error::{ProbeError, ProbeResult};
pub use probe::{LibraryProbe, Probe, StaticProbe};
pub use report::{EnvironmentReport, TargetInfo, describe_environment, describe_environment_with};
