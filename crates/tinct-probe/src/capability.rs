//! Optional native integrations and how to recognize them.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tinct_core::CaseInsensitiveMapping;

use crate::error::ProbeError;

/// An optional native library the colour stack can integrate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    OpenColorIo,
    OpenImageIo,
    LittleCms,
    OpenExr,
}

impl Capability {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OpenColorIo => "OpenColorIO",
            Self::OpenImageIo => "OpenImageIO",
            Self::LittleCms => "LittleCMS",
            Self::OpenExr => "OpenEXR",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::OpenColorIo, Self::OpenImageIo, Self::LittleCms, Self::OpenExr]
    }

    /// Names accepted by [`FromStr`], matched case-insensitively.
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::OpenColorIo => &["OpenColorIO", "OCIO"],
            Self::OpenImageIo => &["OpenImageIO", "OIIO"],
            Self::LittleCms => &["LittleCMS", "lcms", "lcms2"],
            Self::OpenExr => &["OpenEXR", "EXR"],
        }
    }

    /// Library base names, turned into platform file names with
    /// [`libloading::library_filename`]. Unversioned names first.
    pub const fn library_stems(&self) -> &'static [&'static str] {
        match self {
            Self::OpenColorIo => &["OpenColorIO", "OpenColorIO_2_4", "OpenColorIO_2_3", "OpenColorIO_2_2"],
            Self::OpenImageIo => &["OpenImageIO", "OpenImageIO_2_5", "OpenImageIO_2_4"],
            Self::LittleCms => &["lcms2", "lcms2-2"],
            Self::OpenExr => &["OpenEXR", "OpenEXR-3_2", "OpenEXR-3_1", "IlmImf"],
        }
    }

    /// Versioned sonames installed by runtime packages, which usually lack
    /// the unversioned development symlink.
    pub const fn sonames(&self) -> &'static [&'static str] {
        if !cfg!(target_os = "linux") {
            return &[];
        }
        match self {
            Self::OpenColorIo => &["libOpenColorIO.so.2.4", "libOpenColorIO.so.2.3", "libOpenColorIO.so.2.2", "libOpenColorIO.so.2.1"],
            Self::OpenImageIo => &["libOpenImageIO.so.2.5", "libOpenImageIO.so.2.4"],
            Self::LittleCms => &["liblcms2.so.2"],
            Self::OpenExr => &["libOpenEXR-3_2.so.31", "libOpenEXR-3_1.so.30", "libIlmImf-2_5.so.25"],
        }
    }

    /// Installation hint included in [`ProbeError::MissingOptionalDependency`].
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::OpenColorIo => "install OpenColorIO 2.x and make its shared library visible to the dynamic loader",
            Self::OpenImageIo => "install OpenImageIO and make its shared library visible to the dynamic loader",
            Self::LittleCms => "install Little CMS 2 (lcms2)",
            Self::OpenExr => "install OpenEXR 3.x",
        }
    }

    fn names() -> &'static CaseInsensitiveMapping<Capability> {
        static NAMES: OnceLock<CaseInsensitiveMapping<Capability>> = OnceLock::new();
        NAMES.get_or_init(|| {
            Capability::all()
                .iter()
                .flat_map(|capability| capability.aliases().iter().map(move |alias| (*alias, *capability)))
                .collect()
        })
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Capability {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::names()
            .get(s.trim())
            .copied()
            .ok_or_else(|| ProbeError::UnknownCapability(s.to_string()))
    }
}
