//! Transient metadata describing an uploaded artifact during validation.
//!
//! Descriptors are built from multipart parts, checked, and discarded; the
//! pipeline never stores media itself.

/// Kind of uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    pub kind: MediaKind,

    /// MIME type declared by the client (e.g. `image/jpeg`).
    pub mime: String,

    /// Byte size of the uploaded content.
    pub size: u64,

    /// Original client-supplied filename, when present.
    pub filename: Option<String>,
}

impl MediaDescriptor {
    pub fn image(mime: impl Into<String>, size: u64, filename: Option<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            mime: mime.into(),
            size,
            filename,
        }
    }

    pub fn video(mime: impl Into<String>, size: u64, filename: Option<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            mime: mime.into(),
            size,
            filename,
        }
    }

    /// MIME subtype, lowercased (`image/JPEG` → `jpeg`).
    pub fn subtype(&self) -> String {
        self.mime
            .split('/')
            .nth(1)
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}
