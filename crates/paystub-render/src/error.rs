use paystub_core::StubError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Core(#[from] StubError),
    #[error("Rasterization failed: {0}")]
    Rasterize(String),
    #[error("Document write failed: {0}")]
    Write(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Slice rows {offset}..{end} fall outside a {source_height}px tall source")]
    SliceOutOfBounds {
        offset: u32,
        end: u32,
        source_height: u32,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
