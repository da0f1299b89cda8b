use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    BufferSize { width: u32, height: u32, len: usize },

    #[error("bead table has no entry for {0}")]
    UnknownBead(String),

    #[error("no bead matches pixel ({x}, {y})")]
    NoMatch { x: u32, y: u32 },

    #[error("color distance is not finite for {0:?}")]
    NonFiniteDistance([u8; 3]),

    #[error("unable to decode image: {0}")]
    Image(#[from] image::ImageError),
}
