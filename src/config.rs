// config.rs — viewer configuration and tour files
//
// A tour file is a small JSON document bundling one panorama with its
// hotspot annotations and config overrides:
//
//   {
//     "image": "plaza.jpg",
//     "hotspots": [ { "pitch": 0, "yaw": 90, "text": "Cathedral" } ],
//     "config": { "auto_rotate": true }
//   }
//
// A bare image path is accepted everywhere a tour file is; it behaves like a
// tour with no hotspots and default config.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ViewerError;

/// Consumed once at mount; `auto_rotate*`, `enable_zoom` and `show_controls`
/// are also observed by the render loop every frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub show_controls: bool,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub enable_zoom: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            show_controls: true,
            auto_rotate: false,
            auto_rotate_speed: 1.0,
            enable_zoom: false,
        }
    }
}

/// A label pinned to a direction on the panorama sphere. Read-only to the
/// viewer; order is the caller's.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HotspotAnnotation {
    /// Elevation in degrees, [-90, 90].
    pub pitch: f32,
    /// Azimuth in degrees, [0, 360).
    pub yaw: f32,
    pub text: String,
    /// Optional `#rrggbb` marker color.
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tour {
    pub image: PathBuf,
    #[serde(default)]
    pub hotspots: Vec<HotspotAnnotation>,
    #[serde(default)]
    pub config: ViewerConfig,
}

impl Tour {
    /// Wrap a plain panorama image in an empty tour.
    pub fn from_image(path: PathBuf) -> Self {
        Self {
            image: path,
            hotspots: Vec::new(),
            config: ViewerConfig::default(),
        }
    }

    /// Load a `.json` tour file, or treat any other path as a bare image.
    /// Relative image paths inside a tour resolve against the tour's own
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let is_tour = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_tour {
            return Ok(Self::from_image(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| ViewerError::TourRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut tour: Tour =
            serde_json::from_str(&text).map_err(|source| ViewerError::TourParse {
                path: path.to_path_buf(),
                source,
            })?;

        if tour.image.is_relative() {
            if let Some(dir) = path.parent() {
                tour.image = dir.join(&tour.image);
            }
        }
        Ok(tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let c = ViewerConfig::default();
        assert_eq!((c.width, c.height), (1280, 720));
        assert!(c.show_controls);
        assert!(!c.auto_rotate);
        assert_eq!(c.auto_rotate_speed, 1.0);
        assert!(!c.enable_zoom);
    }

    #[test]
    fn full_tour_parses() {
        let json = r##"{
            "image": "plaza.jpg",
            "hotspots": [
                { "pitch": 0, "yaw": 90, "text": "Cathedral", "color": "#ff8800" },
                { "pitch": 45, "yaw": 0, "text": "Sky" }
            ],
            "config": { "auto_rotate": true, "auto_rotate_speed": 1.5 }
        }"##;
        let tour: Tour = serde_json::from_str(json).unwrap();
        assert_eq!(tour.image, PathBuf::from("plaza.jpg"));
        assert_eq!(tour.hotspots.len(), 2);
        assert_eq!(tour.hotspots[0].color.as_deref(), Some("#ff8800"));
        assert_eq!(tour.hotspots[1].color, None);
        assert!(tour.config.auto_rotate);
        assert_eq!(tour.config.auto_rotate_speed, 1.5);
        // Unspecified config fields keep their defaults.
        assert!(!tour.config.enable_zoom);
        assert!(tour.config.show_controls);
    }

    #[test]
    fn image_only_tour_parses() {
        let tour: Tour = serde_json::from_str(r#"{ "image": "a.png" }"#).unwrap();
        assert!(tour.hotspots.is_empty());
        assert_eq!(tour.config, ViewerConfig::default());
    }

    #[test]
    fn bare_image_path_becomes_empty_tour() {
        let tour = Tour::load(Path::new("beach.jpg")).unwrap();
        assert_eq!(tour.image, PathBuf::from("beach.jpg"));
        assert!(tour.hotspots.is_empty());
    }

    #[test]
    fn malformed_tour_reports_parse_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("pano_tour_test_malformed.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Tour::load(&path).unwrap_err();
        assert!(matches!(err, ViewerError::TourParse { .. }), "{err}");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_tour_reports_read_error() {
        let err = Tour::load(Path::new("/nonexistent/t.json")).unwrap_err();
        assert!(matches!(err, ViewerError::TourRead { .. }));
    }

    #[test]
    fn relative_image_resolves_against_tour_dir() {
        let dir = std::env::temp_dir();
        let path = dir.join("pano_tour_test_rel.json");
        std::fs::write(&path, r#"{ "image": "img/pano.jpg" }"#).unwrap();
        let tour = Tour::load(&path).unwrap();
        assert_eq!(tour.image, dir.join("img/pano.jpg"));
        std::fs::remove_file(&path).ok();
    }
}
