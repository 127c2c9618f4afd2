//! Collision map loading
//!
//! The loader reads a map through a [`MapSource`], checks the file-level
//! header, and builds every model independently. A broken model is
//! reported in the [`LoadReport`] and never prevents the rest of the map
//! from loading.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::logging::{info, warn};

use super::collision_model::{CollisionModel, CollisionModelBuilder};
use super::format::{CollisionMapFile, ModelRecord};
use super::LoadError;
use crate::config::CollisionConfig;
use crate::contents::ContentFlags;
use crate::foundation::math::Vec3;

/// Raw map data as handed over by a source
#[derive(Debug, Clone)]
pub struct MapStream {
    /// The serialized collision map
    pub bytes: Vec<u8>,
    /// Checksum tag of the current map revision, when known
    pub checksum: Option<u32>,
}

/// Where collision maps come from
pub trait MapSource {
    /// Open the collision data for `map`
    fn open(&self, map: &str) -> Result<MapStream, LoadError>;
}

/// Maps on disk: `<root>/<map>.cm` with an optional `<root>/<map>.crc`
/// holding the map's checksum as a hexadecimal or decimal number
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    /// Source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn parse_checksum(text: &str) -> Result<u32, LoadError> {
        let text = text.trim();
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => text.parse(),
        };
        parsed.map_err(|e| LoadError::Parse(format!("bad checksum tag {text:?}: {e}")))
    }
}

impl MapSource for FileSystemSource {
    fn open(&self, map: &str) -> Result<MapStream, LoadError> {
        let bytes = std::fs::read(self.root.join(format!("{map}.cm")))?;
        let tag = self.root.join(format!("{map}.crc"));
        let checksum = if tag.exists() {
            Some(Self::parse_checksum(&std::fs::read_to_string(tag)?)?)
        } else {
            None
        };
        Ok(MapStream { bytes, checksum })
    }
}

/// In-memory maps keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    maps: std::collections::HashMap<String, MapStream>,
}

impl MemorySource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a map
    pub fn insert(&mut self, map: &str, text: impl Into<String>, checksum: Option<u32>) {
        self.maps.insert(
            map.to_string(),
            MapStream {
                bytes: text.into().into_bytes(),
                checksum,
            },
        );
    }
}

impl MapSource for MemorySource {
    fn open(&self, map: &str) -> Result<MapStream, LoadError> {
        self.maps.get(map).cloned().ok_or_else(|| {
            LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no collision map named {map}"),
            ))
        })
    }
}

/// A model that could not be built
#[derive(Debug)]
pub struct FailedModel {
    /// Model name from the file
    pub name: String,
    /// Why it failed
    pub error: LoadError,
}

/// Result of loading one map
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully built models in file order
    pub models: Vec<Arc<CollisionModel>>,
    /// Models skipped because of errors
    pub failed: Vec<FailedModel>,
}

impl LoadReport {
    /// Loaded model by name
    pub fn model(&self, name: &str) -> Option<&Arc<CollisionModel>> {
        self.models.iter().find(|m| m.name() == name)
    }
}

/// Turns collision maps into models
#[derive(Debug, Clone, Default)]
pub struct CollisionModelLoader {
    config: CollisionConfig,
}

impl CollisionModelLoader {
    /// Loader using the given tolerances
    pub fn new(config: CollisionConfig) -> Self {
        Self { config }
    }

    /// Tolerances in use
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Load `map` from `source`
    pub fn load(&self, source: &dyn MapSource, map: &str) -> Result<LoadReport, LoadError> {
        let stream = source.open(map)?;
        let report = self.load_bytes(map, &stream.bytes, stream.checksum)?;
        info!(
            "Loaded collision map {}: {} models, {} failed",
            map,
            report.models.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Load a map from raw bytes, checking the stored checksum when
    /// `expected_checksum` is given
    pub fn load_bytes(
        &self,
        map: &str,
        bytes: &[u8],
        expected_checksum: Option<u32>,
    ) -> Result<LoadReport, LoadError> {
        let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
        let file = CollisionMapFile::from_ron_str(text)?;

        if let Some(expected) = expected_checksum {
            if expected != file.map_checksum {
                return Err(LoadError::ChecksumMismatch {
                    map: map.to_string(),
                    expected,
                    found: file.map_checksum,
                });
            }
        }

        let mut report = LoadReport::default();
        let mut names = HashSet::new();
        for record in &file.models {
            let result = if names.insert(record.name.as_str()) {
                self.build_model(record)
            } else {
                Err(LoadError::DuplicateModel(record.name.clone()))
            };
            match result {
                Ok(model) => report.models.push(Arc::new(model)),
                Err(error) => {
                    warn!("Skipping collision model {} in map {}: {}", record.name, map, error);
                    report.failed.push(FailedModel {
                        name: record.name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Build one model from its record
    pub fn build_model(&self, record: &ModelRecord) -> Result<CollisionModel, LoadError> {
        let geometry = |source| LoadError::Geometry {
            model: record.name.clone(),
            source,
        };

        let mut builder = CollisionModelBuilder::new(&record.name, self.config.clone());
        for brush in &record.brushes {
            let planes = brush
                .planes
                .iter()
                .map(|p| crate::geometry::Plane::new(Vec3::from(p.normal), p.dist))
                .collect::<Result<Vec<_>, _>>()
                .map_err(geometry)?;
            builder.add_brush(ContentFlags::from_raw(brush.contents), &planes)?;
        }
        for patch in &record.patches {
            let polygons: Vec<Vec<Vec3>> = patch
                .polygons
                .iter()
                .map(|polygon| polygon.iter().map(|&p| Vec3::from(p)).collect())
                .collect();
            builder.add_patch(ContentFlags::from_raw(patch.contents), &polygons)?;
        }
        builder.build()
    }
}

/// Serialize models into a RON collision map
pub fn write_collision_map<'a>(
    models: impl IntoIterator<Item = &'a CollisionModel>,
    map_checksum: u32,
) -> Result<String, LoadError> {
    let mut file = CollisionMapFile::new(map_checksum);
    file.models = models.into_iter().map(CollisionModel::to_record).collect();
    file.to_ron_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"(
        version: 3,
        map_checksum: 0xbeef,
        models: [
            (
                name: "worldspawn",
                brushes: [
                    (contents: 1, planes: [
                        (normal: (1.0, 0.0, 0.0), dist: 1.0),
                        (normal: (-1.0, 0.0, 0.0), dist: 1.0),
                        (normal: (0.0, 1.0, 0.0), dist: 1.0),
                        (normal: (0.0, -1.0, 0.0), dist: 1.0),
                        (normal: (0.0, 0.0, 1.0), dist: 1.0),
                        (normal: (0.0, 0.0, -1.0), dist: 1.0),
                    ]),
                ],
            ),
            (
                name: "broken",
                brushes: [
                    (contents: 1, planes: [
                        (normal: (1.0, 0.0, 0.0), dist: -1.0),
                        (normal: (-1.0, 0.0, 0.0), dist: -1.0),
                    ]),
                ],
            ),
            (
                name: "ramp",
                patches: [
                    (contents: 1, polygons: [[(0.0, 0.0, 0.0), (4.0, 0.0, 0.0), (4.0, 4.0, 2.0), (0.0, 4.0, 2.0)]]),
                ],
            ),
            (name: "worldspawn", brushes: []),
            (name: "nothing"),
        ],
    )"#;

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert("test", MAP, Some(0xbeef));
        source
    }

    #[test]
    fn test_broken_models_are_isolated() {
        let report = CollisionModelLoader::default().load(&source(), "test").unwrap();

        let loaded: Vec<&str> = report.models.iter().map(|m| m.name()).collect();
        assert_eq!(loaded, ["worldspawn", "ramp"]);

        assert_eq!(report.failed.len(), 3);
        assert!(matches!(report.failed[0].error, LoadError::DegeneratePlaneSet { brush: 0, .. }));
        assert!(matches!(report.failed[1].error, LoadError::DuplicateModel(_)));
        assert!(matches!(report.failed[2].error, LoadError::EmptyModel(_)));
        assert_eq!(report.failed[2].name, "nothing");
    }

    #[test]
    fn test_checksum_mismatch_fails_the_map() {
        let mut source = MemorySource::new();
        source.insert("test", MAP, Some(1));
        assert!(matches!(
            CollisionModelLoader::default().load(&source, "test"),
            Err(LoadError::ChecksumMismatch { expected: 1, found: 0xbeef, .. })
        ));
    }

    #[test]
    fn test_missing_map_is_an_io_error() {
        assert!(matches!(
            CollisionModelLoader::default().load(&source(), "elsewhere"),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn test_non_unit_normal_is_a_model_error() {
        let text = MAP.replace("(normal: (1.0, 0.0, 0.0), dist: 1.0)", "(normal: (2.0, 0.0, 0.0), dist: 1.0)");
        let report = CollisionModelLoader::default().load_bytes("test", text.as_bytes(), None).unwrap();
        assert!(report.model("worldspawn").is_none());
        assert!(matches!(report.failed[0].error, LoadError::Geometry { .. }));
    }

    #[test]
    fn test_file_system_source_reads_checksum_tag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("arena.cm"), MAP).unwrap();
        std::fs::write(dir.path().join("arena.crc"), "0xBEEF\n").unwrap();

        let source = FileSystemSource::new(dir.path());
        let stream = source.open("arena").unwrap();
        assert_eq!(stream.checksum, Some(0xbeef));

        let report = CollisionModelLoader::default().load(&source, "arena").unwrap();
        assert_eq!(report.models.len(), 2);

        std::fs::write(dir.path().join("arena.crc"), "12").unwrap();
        assert!(matches!(
            CollisionModelLoader::default().load(&source, "arena"),
            Err(LoadError::ChecksumMismatch { expected: 12, .. })
        ));
    }

    #[test]
    fn test_written_models_load_back() {
        let loader = CollisionModelLoader::default();
        let report = loader.load(&source(), "test").unwrap();
        let text = write_collision_map(report.models.iter().map(|m| m.as_ref()), 0xbeef).unwrap();

        let reloaded = loader.load_bytes("copy", text.as_bytes(), Some(0xbeef)).unwrap();
        assert!(reloaded.failed.is_empty());
        for (a, b) in report.models.iter().zip(&reloaded.models) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.polytopes().len(), b.polytopes().len());
            assert!((a.bounds().min - b.bounds().min).norm() < 1e-3);
            assert!((a.bounds().max - b.bounds().max).norm() < 1e-3);
        }
    }
}
