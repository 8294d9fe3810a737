use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;

use super::{ContentError, ContentSource};

static TEXTS_DIR: Dir = include_dir!("src/texts");

/// Passages shipped inside the binary; one is picked at random per fetch
#[derive(Debug, Clone, Default)]
pub struct BundledSource;

impl BundledSource {
    /// All passages, ordered by file name
    pub fn passages() -> Vec<&'static str> {
        TEXTS_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "txt"))
            .sorted_by_key(|f| f.path().to_path_buf())
            .filter_map(|f| f.contents_utf8())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl ContentSource for BundledSource {
    fn fetch_reference_text(&self, _test_id: Option<u64>) -> Result<String, ContentError> {
        Self::passages()
            .choose(&mut rand::thread_rng())
            .map(|text| text.to_string())
            .ok_or(ContentError::Empty)
    }
}
