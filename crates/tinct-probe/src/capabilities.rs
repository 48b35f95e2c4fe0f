//! The resolved capability set and gating of optional features.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{ProbeError, ProbeResult};
use crate::probe::{LibraryProbe, Probe};

/// Capabilities found in this process, resolved once and passed to the code
/// that needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    available: BTreeSet<Capability>,
}

impl Capabilities {
    /// Ask `probe` about every known capability.
    pub fn detect_with<P: Probe + ?Sized>(probe: &P) -> Self {
        Self {
            available: Capability::all()
                .iter()
                .copied()
                .filter(|capability| probe.is_available(*capability))
                .collect(),
        }
    }

    /// Probe the dynamic loader's default locations.
    pub fn detect() -> Self {
        Self::detect_with(&LibraryProbe::new())
    }

    /// Capabilities of this process, detected on first use.
    pub fn global() -> &'static Capabilities {
        static GLOBAL: OnceLock<Capabilities> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let capabilities = Self::detect();
            tracing::info!("optional capabilities resolved: {capabilities}");
            capabilities
        })
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        self.available.contains(&capability)
    }

    /// Fail with [`ProbeError::MissingOptionalDependency`] unless `capability`
    /// is available.
    pub fn require(&self, capability: Capability) -> ProbeResult<()> {
        if self.is_available(capability) {
            Ok(())
        } else {
            Err(ProbeError::missing(capability))
        }
    }

    /// Like [`Capabilities::require`], for every capability in `capabilities`.
    pub fn require_all(&self, capabilities: &[Capability]) -> ProbeResult<()> {
        capabilities
            .iter()
            .try_for_each(|capability| self.require(*capability))
    }

    pub fn available(&self) -> impl Iterator<Item = Capability> + '_ {
        self.available.iter().copied()
    }

    pub fn missing(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::all()
            .iter()
            .copied()
            .filter(|capability| !self.is_available(*capability))
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, capability) in Capability::all().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let state = if self.is_available(*capability) { "yes" } else { "no" };
            write!(f, "{capability}: {state}")?;
        }
        Ok(())
    }
}

/// Run `f` only when `capability` is available, failing fast otherwise.
pub fn required<R>(capabilities: &Capabilities, capability: Capability, f: impl FnOnce() -> R) -> ProbeResult<R> {
    capabilities.require(capability)?;
    Ok(f())
}

pub fn is_opencolorio_installed() -> bool {
    Capabilities::global().is_available(Capability::OpenColorIo)
}

pub fn is_openimageio_installed() -> bool {
    Capabilities::global().is_available(Capability::OpenImageIo)
}

pub fn is_littlecms_installed() -> bool {
    Capabilities::global().is_available(Capability::LittleCms)
}

pub fn is_openexr_installed() -> bool {
    Capabilities::global().is_available(Capability::OpenExr)
}
