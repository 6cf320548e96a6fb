//! Viewer state: the resident model and the interaction state of the canvas
//!
//! [`ModelViewer`] holds at most one loaded model. A successful load replaces
//! the previous model as a whole, so the scene, its bounds and its display list
//! always belong to the same file.

use std::path::{Path, PathBuf};

use cgmath::Deg;

use crate::{
    config::{ReloadPolicy, ViewerConfig},
    error::{ImportError, ViewerError},
    gfx::{
        camera::ViewState,
        rendering::DisplayList,
        resources::{FrameUniform, LightRig},
        scene::{scene_bounds, Aabb, DisplayFit, Scene},
    },
    import::{FileImporter, Importer},
};

/// A model that has been imported and prepared for drawing
pub struct LoadedModel {
    pub path: PathBuf,
    pub scene: Scene,
    pub bounds: Aabb,
    pub fit: DisplayFit,
    pub display_list: DisplayList,
    /// Increases with every successful load
    pub generation: u64,
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub path: PathBuf,
    pub nodes: usize,
    pub meshes: usize,
    pub vertices: usize,
    pub faces: usize,
    pub bounds: Aabb,
    pub scale: f32,
    pub generation: u64,
}

impl LoadSummary {
    fn new(model: &LoadedModel) -> Self {
        Self {
            path: model.path.clone(),
            nodes: model.scene.nodes().len(),
            meshes: model.scene.meshes.len(),
            vertices: model.display_list.vertex_count(),
            faces: model.display_list.face_count(),
            bounds: model.bounds,
            scale: model.fit.scale,
            generation: model.generation,
        }
    }
}

/// Everything the renderer needs for one frame
pub struct FrameData<'a> {
    pub model: &'a LoadedModel,
    pub uniform: FrameUniform,
}

enum LoadState {
    Empty,
    Loaded(Box<LoadedModel>),
}

pub struct ModelViewer {
    config: ViewerConfig,
    importer: Box<dyn Importer>,
    state: LoadState,
    view: ViewState,
    lights: LightRig,
    generation: u64,
}

impl ModelViewer {
    /// Creates an empty viewer using the OBJ/STL file importer
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_importer(config, Box::new(FileImporter::with_defaults()))
    }

    pub fn with_importer(config: ViewerConfig, importer: Box<dyn Importer>) -> Self {
        let mut view = ViewState::new(Deg(config.fov));
        view.resize(config.width, config.height);
        Self {
            config,
            importer,
            state: LoadState::Empty,
            view,
            lights: LightRig::default(),
            generation: 0,
        }
    }

    /// Imports `path` and makes it the resident model.
    ///
    /// On failure the previous model stays resident unless the reload policy is
    /// [`ReloadPolicy::DiscardFirst`], in which case the viewer is left empty.
    /// A model without reachable vertices is rejected as
    /// [`ImportError::EmptyScene`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadSummary, ViewerError> {
        let path = path.as_ref();

        if self.config.reload_policy == ReloadPolicy::DiscardFirst {
            self.unload();
        }

        let prepared = self
            .importer
            .import(path)
            .and_then(|scene| self.prepare(path, scene));

        match prepared {
            Ok(model) => {
                // the old model goes before the new one is installed
                self.state = LoadState::Empty;
                let summary = LoadSummary::new(&model);
                self.state = LoadState::Loaded(Box::new(model));

                log::info!(
                    "Loaded {}: {} mesh(es), {} vertices, {} face(s), scale {:.4}",
                    path.display(),
                    summary.meshes,
                    summary.vertices,
                    summary.faces,
                    summary.scale
                );
                Ok(summary)
            }
            Err(source) => {
                let err = ViewerError::ImportFailed {
                    path: path.to_path_buf(),
                    source,
                };
                log::error!("{}", err);
                if self.is_loaded() {
                    log::info!("Keeping previously loaded model");
                }
                Err(err)
            }
        }
    }

    fn prepare(&mut self, path: &Path, scene: Scene) -> Result<LoadedModel, ImportError> {
        let bounds = scene_bounds(&scene);
        let fit = DisplayFit::from_bounds(&bounds, self.config.display_extent)
            .ok_or(ImportError::EmptyScene)?;
        log::debug!(
            "Bounds min {:?} max {:?}, center {:?}",
            bounds.min,
            bounds.max,
            fit.center
        );

        let display_list = DisplayList::build(&scene);
        self.generation += 1;

        Ok(LoadedModel {
            path: path.to_path_buf(),
            scene,
            bounds,
            fit,
            display_list,
            generation: self.generation,
        })
    }

    /// Releases the resident model, if any
    pub fn unload(&mut self) {
        if let LoadState::Loaded(model) = std::mem::replace(&mut self.state, LoadState::Empty) {
            log::debug!("Released {}", model.path.display());
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        match &self.state {
            LoadState::Loaded(model) => Some(model.as_ref()),
            LoadState::Empty => None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.view.resize(width, height);
    }

    /// Feeds a cursor move to the trackball. Returns true when a redraw is needed.
    pub fn mouse_move(&mut self, x: f32, y: f32, dragging: bool) -> bool {
        self.view.mouse_move(x, y, dragging) && self.is_loaded()
    }

    /// Frame data for the resident model, `None` while empty
    pub fn frame(&self) -> Option<FrameData<'_>> {
        let model = self.model()?;
        let model_view = self.view.view_matrix(self.config.camera_distance, &model.fit);
        let projection = self.view.projection_matrix(self.config.znear, self.config.zfar);
        Some(FrameData {
            model,
            uniform: FrameUniform::new(model_view, projection, &self.lights),
        })
    }
}
