//! Model file import
//!
//! Format importers turn a file into a [`Scene`]. [`FileImporter`] keeps a
//! registry of them keyed by lowercase file extension and is the default
//! [`Importer`] used by the viewer.

pub mod obj;
pub mod stl;

use std::{collections::HashMap, path::Path};

use crate::{error::ImportError, gfx::scene::Scene};

pub use obj::ObjImporter;
pub use stl::StlImporter;

/// Anything that can produce a scene from a path
pub trait Importer {
    fn import(&self, path: &Path) -> Result<Scene, ImportError>;
}

/// Importer for a single file format
pub trait FormatImporter: Send + Sync {
    /// Get the format name this importer handles
    fn format_name(&self) -> &'static str;

    /// Lowercase file extensions without the leading dot
    fn extensions(&self) -> &[&'static str];

    fn import(&self, path: &Path) -> Result<Scene, ImportError>;
}

/// Extension-dispatching importer
pub struct FileImporter {
    importers: Vec<Box<dyn FormatImporter>>,
    by_extension: HashMap<String, usize>,
}

impl Default for FileImporter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FileImporter {
    /// Create an importer with no formats registered
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Create an importer that handles OBJ and STL
    pub fn with_defaults() -> Self {
        let mut importer = Self::new();
        importer.register(Box::new(ObjImporter));
        importer.register(Box::new(StlImporter));
        importer
    }

    /// Registers a format importer. Later registrations win for shared extensions.
    pub fn register(&mut self, importer: Box<dyn FormatImporter>) {
        let index = self.importers.len();
        for extension in importer.extensions() {
            self.by_extension.insert(extension.to_lowercase(), index);
        }
        self.importers.push(importer);
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.importer_for(path).is_some()
    }

    /// Sorted list of registered extensions
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    fn importer_for(&self, path: &Path) -> Option<&dyn FormatImporter> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        self.by_extension
            .get(&extension)
            .and_then(|&index| self.importers.get(index))
            .map(|importer| importer.as_ref())
    }
}

impl Importer for FileImporter {
    fn import(&self, path: &Path) -> Result<Scene, ImportError> {
        let importer = self.importer_for(path).ok_or_else(|| {
            ImportError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })?;

        log::debug!("Importing {} as {}", path.display(), importer.format_name());
        let scene = importer.import(path)?;
        log::debug!(
            "Imported {} node(s), {} vertices, {} face(s)",
            scene.nodes().len(),
            scene.vertex_count(),
            scene.face_count()
        );
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_obj_and_stl() {
        let importer = FileImporter::with_defaults();
        assert_eq!(importer.supported_extensions(), vec!["obj", "stl"]);
        assert!(importer.supports(Path::new("model.OBJ")));
        assert!(importer.supports(Path::new("dir/part.Stl")));
        assert!(!importer.supports(Path::new("scene.fbx")));
        assert!(!importer.supports(Path::new("no_extension")));
    }

    #[test]
    fn test_unknown_extension_is_rejected_before_io() {
        let importer = FileImporter::with_defaults();
        match importer.import(Path::new("missing/scene.fbx")) {
            Err(ImportError::UnsupportedFormat(ext)) => assert_eq!(ext, "fbx"),
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let importer = FileImporter::with_defaults();
        let dir = tempfile::tempdir().unwrap();
        let result = importer.import(&dir.path().join("absent.stl"));
        assert!(matches!(result, Err(ImportError::Io(_))));
    }
}
