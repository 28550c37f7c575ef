use crate::stanford_cars::{StanfordCarsError, StanfordCarsResult};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A row of the labels CSV. Columns other than these two are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    pub image_fname: String,
    pub class: usize,
}

/// Maps image file names to class ids.
///
/// Built once from the labels CSV and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    rows: Vec<LabelRow>,
    /// Row index of the first occurrence of each file name.
    by_fname: HashMap<String, usize>,
}

impl LabelTable {
    /// Reads a CSV with a header row containing at least `image_fname` and `class`.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> StanfordCarsResult<Self> {
        let path = path.as_ref();
        let csv_err = |source| StanfordCarsError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;
        let rows = reader
            .deserialize::<LabelRow>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        Ok(Self::from_rows(rows))
    }

    pub fn from_rows(rows: Vec<LabelRow>) -> Self {
        let mut by_fname = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            by_fname.entry(row.image_fname.clone()).or_insert(i);
        }
        Self { rows, by_fname }
    }

    /// Number of rows, duplicates included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabelRow] {
        &self.rows
    }

    /// Class id of `fname`. For duplicated names the first row wins.
    pub fn class_of(&self, fname: &str) -> Option<usize> {
        self.by_fname.get(fname).map(|&i| self.rows[i].class)
    }

    pub fn contains(&self, fname: &str) -> bool {
        self.by_fname.contains_key(fname)
    }

    /// The distinct file names, in no particular order.
    pub fn fnames(&self) -> impl Iterator<Item = &str> {
        self.by_fname.keys().map(String::as_str)
    }

    /// Number of distinct class ids.
    pub fn num_classes(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.class)
            .collect::<HashSet<_>>()
            .len()
    }
}
