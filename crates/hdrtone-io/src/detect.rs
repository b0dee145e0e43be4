//! Format detection utilities.
//!
//! Decoder selection is driven by the file extension alone (case-insensitive),
//! with [`FileFormat::CommonLdr`] as the fallback for anything unrecognized.
//! Magic-byte sniffing is available separately for diagnostics.

use std::fmt;
use std::path::Path;

/// Input image format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileFormat {
    /// PNG, JPEG and everything else the general-purpose codec handles.
    #[default]
    CommonLdr,
    /// OpenEXR.
    OpenExr,
    /// Radiance RGBE (`.hdr`).
    RadianceHdr,
    /// Portable Float Map.
    Pfm,
}

impl FileFormat {
    /// Detects format from file extension only.
    ///
    /// `.exr`, `.hdr` and `.pfm` map to their decoders; every other
    /// extension, or none, maps to [`FileFormat::CommonLdr`].
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("exr") => FileFormat::OpenExr,
            Some("hdr") => FileFormat::RadianceHdr,
            Some("pfm") => FileFormat::Pfm,
            _ => FileFormat::CommonLdr,
        }
    }

    /// Detects format from leading file bytes.
    ///
    /// Returns `None` when no HDR signature matches; the bytes may still be
    /// a valid LDR file.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        // EXR: 0x76 0x2f 0x31 0x01
        if bytes.len() >= 4 && bytes[0..4] == [0x76, 0x2f, 0x31, 0x01] {
            return Some(FileFormat::OpenExr);
        }
        // HDR: "#?"
        if bytes.len() >= 2 && bytes[0..2] == [b'#', b'?'] {
            return Some(FileFormat::RadianceHdr);
        }
        // PFM: "PF" (color) or "Pf" (grayscale) followed by whitespace
        if bytes.len() >= 3
            && bytes[0] == b'P'
            && (bytes[1] == b'F' || bytes[1] == b'f')
            && bytes[2].is_ascii_whitespace()
        {
            return Some(FileFormat::Pfm);
        }
        None
    }

    /// Human-readable format name.
    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::CommonLdr => "common ldr",
            FileFormat::OpenExr => "OpenEXR",
            FileFormat::RadianceHdr => "HDR/RGBE",
            FileFormat::Pfm => "PFM",
        }
    }

    /// Whether decoded samples are linear radiance.
    pub fn is_linear(&self) -> bool {
        !matches!(self, FileFormat::CommonLdr)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
