use image::RgbaImage;
use std::path::Path;
use tracing::info;
use um_catalog::Item;

use crate::{MatchError, MatchResult, Result};

/// Receives intermediate data of one `find_item` call.
/// Read-only introspection; never influences the decision.
pub trait MatchObserver {
    /// The artwork cropped out of the screenshot
    fn unique_image(&mut self, _image: &RgbaImage) {}

    /// The artwork after cropping to a candidate's inventory footprint
    fn candidate_image(&mut self, _item: &Item, _image: &RgbaImage) {}

    /// Best result of every scored candidate
    fn results(&mut self, _results: &[MatchResult]) {}
}

pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// Keeps everything a call exposes, for external visualization.
#[derive(Debug, Default)]
pub struct DebugCollector {
    pub unique_image: Option<RgbaImage>,
    pub candidate_images: Vec<(String, RgbaImage)>,
    pub results_all: Vec<MatchResult>,
}

impl MatchObserver for DebugCollector {
    fn unique_image(&mut self, image: &RgbaImage) {
        self.unique_image = Some(image.clone());
    }

    fn candidate_image(&mut self, item: &Item, image: &RgbaImage) {
        self.candidate_images.push((item.file.clone(), image.clone()));
    }

    fn results(&mut self, results: &[MatchResult]) {
        self.results_all = results.to_vec();
    }
}

impl DebugCollector {
    /// Write the collected images as PNG and the scores as `results.json`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|source| MatchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        if let Some(image) = &self.unique_image {
            save_png(image, &dir.join("unique.png"))?;
        }

        for (file, image) in &self.candidate_images {
            save_png(image, &dir.join(format!("candidate_{}.png", file)))?;
        }

        for (i, result) in self.results_all.iter().enumerate() {
            if let Some(template) = &result.template {
                let name = format!("template_{}_{}.png", i, result.item.file);
                save_png(&template.image, &dir.join(name))?;
            }
        }

        let json_path = dir.join("results.json");
        let json = serde_json::to_string_pretty(&self.results_all).map_err(|e| MatchError::Io {
            path: json_path.clone(),
            source: e.into(),
        })?;
        std::fs::write(&json_path, json).map_err(|source| MatchError::Io {
            path: json_path.clone(),
            source,
        })?;

        info!("Debug data saved to {}", dir.display());
        Ok(())
    }
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| MatchError::Image {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchedBy;
    use std::path::PathBuf;

    #[test]
    fn test_collector_saves_everything() {
        let item = Item {
            name: "Wanderlust".into(),
            file: "Wanderlust".into(),
            alias: None,
            icon: PathBuf::from("Wanderlust.png"),
            base: "Wool Shoes".into(),
            sockets: 0,
            columns: 0,
            width: 2,
            height: 2,
        };

        let mut collector = DebugCollector::default();
        collector.unique_image(&RgbaImage::new(99, 200));
        collector.candidate_image(&item, &RgbaImage::new(99, 100));
        collector.results(&[MatchResult::decided(item, MatchedBy::TemplateMatch, false)]);

        let dir = tempfile::tempdir().unwrap();
        collector.save(dir.path()).unwrap();

        assert!(dir.path().join("unique.png").exists());
        assert!(dir.path().join("candidate_Wanderlust.png").exists());
        let json = std::fs::read_to_string(dir.path().join("results.json")).unwrap();
        assert!(json.contains("Wanderlust"));
    }
}
