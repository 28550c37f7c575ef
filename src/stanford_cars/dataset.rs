//! The Stanford Cars dataset: a directory of `.jpg` images plus a CSV table mapping each
//! image file name to its class id.
//!
//! Reference: https://ai.stanford.edu/~jkrause/cars/car_dataset.html

use crate::stanford_cars::{
    LabelTable, MISMATCH_EXAMPLES, StanfordCarsError, StanfordCarsResult,
};
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSION: &str = ".jpg";
pub const CHANNELS: usize = 3;
pub const DEFAULT_HEIGHT: usize = 225;
pub const DEFAULT_WIDTH: usize = 225;

/// Stanford Cars item.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StanfordCarsItem {
    pub image_fname: String,

    /// RGB image as a flat array of floats.
    /// Each value is a channel intensity, in between 0.0 and 1.0.
    ///
    /// # Shape
    /// [CHANNELS * height * width], in CHW order.
    pub image: Vec<f32>,

    pub height: usize,
    pub width: usize,

    /// Class id, as found in the labels table.
    pub label: usize,
}

#[derive(Config, Debug)]
pub struct StanfordCarsConfig {
    /// Directory holding the `.jpg` images.
    pub data_path: PathBuf,

    /// CSV file with the `image_fname` and `class` columns.
    pub labels_path: PathBuf,

    /// Height every image is resized to.
    #[config(default = 225)]
    pub image_height: usize,

    /// Width every image is resized to.
    #[config(default = 225)]
    pub image_width: usize,
}

impl StanfordCarsConfig {
    /// Returns the loaded and validated dataset.
    pub fn init(&self) -> StanfordCarsResult<StanfordCarsDataset> {
        StanfordCarsDataset::new(
            &self.data_path,
            &self.labels_path,
            [self.image_height, self.image_width],
        )
    }
}

/// Indexes the images of a directory and labels them through a [LabelTable].
///
/// Images are read from disk and resized on every access; caching, batching and
/// shuffling are left to burn's data loader.
#[derive(Debug, Clone)]
pub struct StanfordCarsDataset {
    data_path: PathBuf,
    /// Sorted by name.
    image_fnames: Vec<String>,
    labels: LabelTable,
    /// [height, width]
    image_size: [usize; 2],
}

impl StanfordCarsDataset {
    /// Loads the dataset, resizing images to `image_size` (`[height, width]`).
    ///
    /// Fails if the images on disk and the rows of the labels table disagree, either in
    /// count or in file names.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        data_path: P,
        labels_path: Q,
        image_size: [usize; 2],
    ) -> StanfordCarsResult<Self> {
        let data_path = data_path.as_ref();
        let image_fnames = Self::read_image_fnames(data_path)?;
        let labels = LabelTable::from_csv(labels_path)?;

        Self::check_consistency(&image_fnames, &labels)?;

        log::info!(
            "loaded stanford cars from {data_path:?}: {} images, {} classes",
            image_fnames.len(),
            labels.num_classes()
        );

        Ok(Self {
            data_path: data_path.to_path_buf(),
            image_fnames,
            labels,
            image_size,
        })
    }

    /// Same as [`Self::new`], with images resized to 225×225.
    pub fn with_default_size<P: AsRef<Path>, Q: AsRef<Path>>(
        data_path: P,
        labels_path: Q,
    ) -> StanfordCarsResult<Self> {
        Self::new(data_path, labels_path, [DEFAULT_HEIGHT, DEFAULT_WIDTH])
    }

    /// Lists the `.jpg` file names directly under `data_path`, sorted.
    fn read_image_fnames(data_path: &Path) -> StanfordCarsResult<Vec<String>> {
        let io_err = |source| StanfordCarsError::Io {
            path: data_path.to_path_buf(),
            source,
        };

        let mut fnames = Vec::new();
        for entry in std::fs::read_dir(data_path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            // non-utf8 names can't appear in the labels table anyway
            let Ok(fname) = entry.file_name().into_string() else {
                continue;
            };
            if fname.ends_with(IMAGE_EXTENSION) {
                fnames.push(fname);
            }
        }
        fnames.sort_unstable();

        Ok(fnames)
    }

    fn check_consistency(image_fnames: &[String], labels: &LabelTable) -> StanfordCarsResult<()> {
        if image_fnames.len() != labels.len() {
            return Err(StanfordCarsError::CountMismatch {
                images: image_fnames.len(),
                labels: labels.len(),
            });
        }

        let on_disk: HashSet<&str> = image_fnames.iter().map(String::as_str).collect();
        let mut missing_labels: Vec<String> = image_fnames
            .iter()
            .filter(|fname| !labels.contains(fname))
            .cloned()
            .collect();
        let mut missing_images: Vec<String> = labels
            .fnames()
            .filter(|fname| !on_disk.contains(fname))
            .map(str::to_string)
            .collect();

        if missing_labels.is_empty() && missing_images.is_empty() {
            return Ok(());
        }

        missing_labels.truncate(MISMATCH_EXAMPLES);
        missing_images.sort_unstable();
        missing_images.truncate(MISMATCH_EXAMPLES);
        Err(StanfordCarsError::NameMismatch {
            missing_labels,
            missing_images,
        })
    }

    /// Loads, converts and labels the image at `index`.
    pub fn try_get(&self, index: usize) -> StanfordCarsResult<StanfordCarsItem> {
        let image_fname = self
            .image_fnames
            .get(index)
            .ok_or(StanfordCarsError::OutOfRange {
                index,
                len: self.image_fnames.len(),
            })?;

        let image_path = self.data_path.join(image_fname);
        let image = self.load_image(&image_path)?;

        let label = self
            .labels
            .class_of(image_fname)
            .ok_or_else(|| StanfordCarsError::MissingLabel {
                fname: image_fname.clone(),
            })?;

        let [height, width] = self.image_size;
        Ok(StanfordCarsItem {
            image_fname: image_fname.clone(),
            image,
            height,
            width,
            label,
        })
    }

    /// Reads the image as RGB, resizes it (ignoring the aspect ratio) and lays it out as
    /// CHW floats in `[0, 1]`.
    fn load_image(&self, path: &Path) -> StanfordCarsResult<Vec<f32>> {
        let [height, width] = self.image_size;

        let image = image::open(path)
            .map_err(|source| StanfordCarsError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let image = image::imageops::resize(
            &image,
            width as u32,
            height as u32,
            FilterType::Triangle,
        );
        debug_assert_eq!((width as u32, height as u32), image.dimensions());

        let plane = height * width;
        let mut chw = vec![0f32; CHANNELS * plane];
        for (i, pixel) in image.pixels().enumerate() {
            for (c, &value) in pixel.0.iter().enumerate() {
                let value: f32 = value.as_();
                chw[c * plane + i] = value / 255.;
            }
        }

        Ok(chw)
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// The image file names, in index order.
    pub fn image_fnames(&self) -> &[String] {
        &self.image_fnames
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// [height, width]
    pub fn image_size(&self) -> [usize; 2] {
        self.image_size
    }
}

impl Dataset<StanfordCarsItem> for StanfordCarsDataset {
    /// # Panics
    /// If the image can't be read or decoded. Use [`StanfordCarsDataset::try_get`] to handle
    /// that case instead; a `None` here would end the dataset iteration early.
    fn get(&self, index: usize) -> Option<StanfordCarsItem> {
        if index >= self.image_fnames.len() {
            return None;
        }
        let item = self
            .try_get(index)
            .unwrap_or_else(|err| panic!("stanford cars item {index}: {err}"));
        Some(item)
    }

    fn len(&self) -> usize {
        self.image_fnames.len()
    }
}
