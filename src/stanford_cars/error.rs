use std::path::PathBuf;
use thiserror::Error;

pub type StanfordCarsResult<T> = Result<T, StanfordCarsError>;

/// How many example names a [StanfordCarsError::NameMismatch] carries per side.
pub const MISMATCH_EXAMPLES: usize = 5;

#[derive(Debug, Error)]
pub enum StanfordCarsError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label file error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("number of images and labels do not match: {images} != {labels}")]
    CountMismatch { images: usize, labels: usize },
    #[error(
        "image filenames do not match the label table \
         (without label: {missing_labels:?}, without image: {missing_images:?})"
    )]
    NameMismatch {
        /// Image files on disk that have no row in the label table.
        missing_labels: Vec<String>,
        /// Label rows whose image file is not on disk.
        missing_images: Vec<String>,
    },
    #[error("no label for image {fname}")]
    MissingLabel { fname: String },
    #[error("index {index} out of range for a dataset of {len} images")]
    OutOfRange { index: usize, len: usize },
}
