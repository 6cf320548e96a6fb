//! Viewer configuration

/// What happens to the resident model when a new load fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Keep showing the previous model
    #[default]
    RetainPrevious,
    /// Release the previous model before importing, leaving the viewer empty on failure
    DiscardFirst,
}

/// Settings for the window, camera and load behavior
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Background RGBA
    pub clear_color: [f64; 4],
    /// Distance from the eye to the model center along -z
    pub camera_distance: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Size the largest bounding box extent is scaled to
    pub display_extent: f32,
    pub znear: f32,
    pub zfar: f32,
    pub reload_policy: ReloadPolicy,
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Model View".to_string(),
            width: 1200,
            height: 800,
            clear_color: [0.3, 0.4, 0.6, 1.0],
            camera_distance: 20.0,
            fov: 45.0,
            display_extent: 10.0,
            znear: 1.0,
            zfar: 100.0,
            reload_policy: ReloadPolicy::RetainPrevious,
            vsync: true,
        }
    }
}

impl ViewerConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_camera_distance(mut self, distance: f32) -> Self {
        self.camera_distance = distance;
        self
    }

    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov = degrees.clamp(1.0, 179.0);
        self
    }

    pub fn with_display_extent(mut self, extent: f32) -> Self {
        self.display_extent = extent;
        self
    }

    pub fn with_depth_range(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn with_reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.reload_policy = policy;
        self
    }

    pub fn with_vsync(mut self, enable: bool) -> Self {
        self.vsync = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera_distance, 20.0);
        assert_eq!(config.fov, 45.0);
        assert_eq!(config.display_extent, 10.0);
        assert_eq!((config.znear, config.zfar), (1.0, 100.0));
        assert_eq!(config.reload_policy, ReloadPolicy::RetainPrevious);
    }

    #[test]
    fn test_builder_clamps() {
        let config = ViewerConfig::default().with_window_size(0, 0).with_fov(500.0);
        assert_eq!((config.width, config.height), (1, 1));
        assert_eq!(config.fov, 179.0);
    }
}
