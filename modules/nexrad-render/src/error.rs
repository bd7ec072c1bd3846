use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a Level II volume: {0}")]
    NotLevel2(String),

    #[error("Truncated {what} at byte {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("Decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Volume contains no radials")]
    Empty,

    #[error("Legacy message 1 volume, not supported")]
    LegacyFormat,

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RenderError::Io { path, source }
    }

    /// The input was not a readable volume, as opposed to a failure writing
    /// the output.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            RenderError::NotLevel2(_)
                | RenderError::Truncated { .. }
                | RenderError::Decompress(_)
                | RenderError::Empty
                | RenderError::LegacyFormat
        )
    }
}
