//! Probes answering whether a capability is present.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::capability::Capability;

/// Answers whether a capability can be used in this process.
///
/// Implementations must not panic; an inconclusive check is a `false`.
pub trait Probe: Send + Sync {
    fn is_available(&self, capability: Capability) -> bool;
}

/// Probes by loading one of the capability's shared libraries.
///
/// The library is unloaded as soon as it has been found; no symbol is
/// resolved and nothing is linked.
#[derive(Debug, Clone)]
pub struct LibraryProbe {
    search_paths: Vec<PathBuf>,
    system: bool,
}

impl LibraryProbe {
    /// Search the dynamic loader's default locations.
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            system: true,
        }
    }

    /// Search only `directories`.
    pub fn in_directories(directories: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: directories.into_iter().map(Into::into).collect(),
            system: false,
        }
    }

    /// Also search `directory`, before the loader's default locations.
    #[must_use]
    pub fn with_search_path(mut self, directory: impl Into<PathBuf>) -> Self {
        self.search_paths.push(directory.into());
        self
    }

    /// Every file name or path tried for `capability`, in order.
    pub fn candidates(&self, capability: Capability) -> Vec<OsString> {
        let names: Vec<OsString> = capability
            .library_stems()
            .iter()
            .map(libloading::library_filename)
            .chain(capability.sonames().iter().map(OsString::from))
            .collect();

        let mut candidates = Vec::new();
        for directory in &self.search_paths {
            candidates.extend(names.iter().map(|name| directory.join(name).into_os_string()));
        }
        if self.system {
            candidates.extend(names);
        }
        candidates
    }
}

impl Default for LibraryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for LibraryProbe {
    fn is_available(&self, capability: Capability) -> bool {
        for candidate in self.candidates(capability) {
            // SAFETY: loading runs the library's initialisers. The handle is
            // dropped immediately and no symbols are called.
            match unsafe { libloading::Library::new(&candidate) } {
                Ok(_library) => {
                    tracing::debug!("{capability} found at {}", candidate.to_string_lossy());
                    return true;
                }
                Err(err) => {
                    tracing::trace!("{capability} not at {}: {err}", candidate.to_string_lossy());
                }
            }
        }
        tracing::debug!("{capability} not found");
        false
    }
}

/// Fixed answers, for injecting a known environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProbe {
    available: BTreeSet<Capability>,
}

impl StaticProbe {
    pub fn new(available: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            available: available.into_iter().collect(),
        }
    }

    /// Nothing available.
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything available.
    pub fn all() -> Self {
        Self::new(Capability::all().iter().copied())
    }

    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        self.available.insert(capability);
        self
    }
}

impl Probe for StaticProbe {
    fn is_available(&self, capability: Capability) -> bool {
        self.available.contains(&capability)
    }
}
