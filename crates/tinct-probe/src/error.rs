use crate::capability::Capability;

/// Result alias for capability checks.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("{capability} is required but was not found; {hint}")]
    MissingOptionalDependency {
        capability: Capability,
        hint: &'static str,
    },
    #[error("unknown capability {0:?}")]
    UnknownCapability(String),
}

impl ProbeError {
    pub(crate) fn missing(capability: Capability) -> Self {
        Self::MissingOptionalDependency {
            capability,
            hint: capability.hint(),
        }
    }
}
