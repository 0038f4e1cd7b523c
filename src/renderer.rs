use std::rc::Rc;
use std::time::Instant;

use nalgebra as na;
use na::Vector3;

use crate::error::{Error, Result};
use crate::output::save_resource;
use crate::pipeline::{Buffer, RasterError, Rasterizer, FAR_DEPTH};
use crate::settings::Settings;
use crate::util::UnsignedColor;
use crate::world::{Camera, Model, Vertex};

/// Flat color the rendered scene is composited against.
pub const BACKGROUND: UnsignedColor = UnsignedColor::new(111, 5, 243);

/// Lifecycle of a renderer: init once, then render (and update) frames, destroy at the end.
pub trait Renderer {
    fn init(&mut self) -> Result<()>;
    fn render(&mut self) -> Result<()>;
    /// Hook for animation, nothing moves yet.
    fn update(&mut self) {}
    fn destroy(&mut self) {}
}

/// State created by init() and owned for the renderer lifetime.
struct Resources {
    rasterizer: Rasterizer<Vertex, UnsignedColor>,
    model: Model,
    camera: Camera,
}

/// Renders the model with flat ambient colors on the CPU and blends the result with a flat
/// background.
pub struct RasterizationRenderer {
    settings: Settings,
    resources: Option<Resources>,
}

/// Camera as described by settings.
pub fn camera_from_settings(settings: &Settings) -> Camera {
    let mut camera = Camera::new();
    camera.set_width(settings.width as f32);
    camera.set_height(settings.height as f32);
    camera.set_position(Vector3::from(settings.camera_position));
    camera.set_theta(settings.camera_theta);
    camera.set_phi(settings.camera_phi);
    camera.set_angle_of_view(settings.camera_angle_of_view);
    camera.set_z_near(settings.camera_z_near);
    camera.set_z_far(settings.camera_z_far);
    return camera;
}

impl RasterizationRenderer {
    pub fn new(settings: Settings) -> Self {
        return Self {
            settings,
            resources: None,
        };
    }

    pub fn settings(&self) -> &Settings {
        return &self.settings;
    }

    /// Same as init(), but with an already loaded model.
    pub fn init_with_model(&mut self, model: Model) -> Result<()> {
        self.settings.validate()?;
        let (width, height) = (self.settings.width, self.settings.height);

        let mut rasterizer = Rasterizer::new();
        rasterizer.set_viewport(width, height);
        rasterizer.set_render_target(Buffer::new(width, height), Some(Buffer::filled(width, height, FAR_DEPTH)))?;

        self.resources = Some(Resources {
            rasterizer,
            model,
            camera: camera_from_settings(&self.settings),
        });
        log::info!("Renderer initialized with {}x{} render target", width, height);
        return Ok(());
    }

    pub fn render_target(&self) -> Option<&Buffer<UnsignedColor>> {
        return self.resources.as_ref()?.rasterizer.render_target();
    }

    pub fn depth_buffer(&self) -> Option<&Buffer<f32>> {
        return self.resources.as_ref()?.rasterizer.depth_buffer();
    }

    pub fn camera(&self) -> Option<&Camera> {
        return self.resources.as_ref().map(|resources| &resources.camera);
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        return self.resources.as_mut().map(|resources| &mut resources.camera);
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        return self.resources.as_mut().map(|resources| &mut resources.model);
    }

    /// Draws the model and blends it with the background. Result stays in the render target.
    pub fn render_frame(&mut self) -> Result<()> {
        let transparency = self.settings.transparency;
        let Resources {
            rasterizer,
            model,
            camera,
        } = self.resources.as_mut().ok_or(Error::NotInitialized)?;

        // All submeshes share the world matrix, so the full transform is computed once a frame.
        let matrix = camera.projection_matrix() * camera.view_matrix() * model.world_matrix();
        rasterizer.set_vertex_shader(move |position, data: Vertex| (matrix * position, data));
        // Flat shading: no lighting, just the material ambient color.
        rasterizer.set_pixel_shader(|data: Vertex, _z| data.ambient_color());

        let background = BACKGROUND;
        let begin = Instant::now();
        rasterizer.clear_render_target(background)?;
        log::info!("Clearing took {:.3} ms", begin.elapsed().as_secs_f64() * 1000.0);

        let begin = Instant::now();
        for submesh in model.submeshes() {
            rasterizer.set_index_buffer(Rc::clone(&submesh.index_buffer));
            rasterizer.set_vertex_buffer(Rc::clone(&submesh.vertex_buffer));
            rasterizer.draw(submesh.index_buffer.get_number_of_elements(), 0)?;
        }
        log::info!("Rendering took {:.3} ms", begin.elapsed().as_secs_f64() * 1000.0);
        // Shaders don't outlive the frame they were built for.
        rasterizer.clear_shaders();

        // Scene snapshot is blended against a freshly cleared, flat background.
        let scene_image = rasterizer
            .render_target()
            .ok_or(RasterError::Unbound("render target"))?
            .clone();
        rasterizer.clear_render_target(background)?;
        let render_target = rasterizer
            .render_target_mut()
            .ok_or(RasterError::Unbound("render target"))?;
        for (pixel, scene_pixel) in render_target.iter_mut().zip(scene_image.iter()) {
            *pixel = UnsignedColor::blend(*scene_pixel, *pixel, transparency);
        }
        return Ok(());
    }
}

impl Renderer for RasterizationRenderer {
    fn init(&mut self) -> Result<()> {
        self.settings.validate()?;
        let model = Model::load_obj(&self.settings.model_path)?;
        return self.init_with_model(model);
    }

    /// Renders a frame and saves it to the result path. Nothing is saved, if the frame fails.
    fn render(&mut self) -> Result<()> {
        self.render_frame()?;
        let render_target = self.render_target().ok_or(Error::NotInitialized)?;
        save_resource(render_target, &self.settings.result_path)?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsError;
    use crate::world::Submesh;
    use na::vector;
    use std::fs;
    use std::path::PathBuf;

    fn settings(width: usize, height: usize, transparency: f32) -> Settings {
        return Settings {
            width,
            height,
            transparency,
            camera_z_near: 0.1,
            camera_z_far: 10.0,
            ..Default::default()
        };
    }

    /// Triangle that covers the whole viewport once combined transform is undone.
    fn full_screen_model(ambient: UnsignedColor) -> Model {
        let ambient = vector![ambient.r as f32, ambient.g as f32, ambient.b as f32] / 255.0;
        let vertices = [vector![-1.0, -1.0, 0.0], vector![3.0, -1.0, 0.0], vector![-1.0, 3.0, 0.0]]
            .iter()
            .map(|&position| Vertex {
                position,
                ambient,
                ..Default::default()
            })
            .collect();
        return Model::from_submeshes(vec![Submesh::new(vertices, vec![0, 1, 2])]);
    }

    /// Initialized renderer, where the model is placed right in front of the camera.
    fn full_screen_renderer(settings: Settings, ambient: UnsignedColor) -> RasterizationRenderer {
        let mut renderer = RasterizationRenderer::new(settings);
        renderer.init_with_model(full_screen_model(ambient)).unwrap();
        let camera = renderer.camera().unwrap();
        let camera_matrix = camera.projection_matrix() * camera.view_matrix();
        renderer
            .model_mut()
            .unwrap()
            .set_world_matrix(camera_matrix.try_inverse().unwrap());
        return renderer;
    }

    #[test]
    fn init_sizes_render_target_and_depth_buffer() {
        for (width, height) in [(1, 1), (7, 3), (64, 48)] {
            let mut renderer = RasterizationRenderer::new(settings(width, height, 1.0));
            renderer.init_with_model(full_screen_model(BACKGROUND)).unwrap();
            let render_target = renderer.render_target().unwrap();
            let depth_buffer = renderer.depth_buffer().unwrap();
            assert_eq!(render_target.get_number_of_elements(), width * height);
            assert!(depth_buffer.same_dimensions(render_target));
        }
    }

    #[test]
    fn half_transparent_scene_is_blended_with_background() {
        let mut renderer = full_screen_renderer(settings(2, 2, 0.5), UnsignedColor::new(10, 20, 30));
        renderer.render_frame().unwrap();
        let render_target = renderer.render_target().unwrap();
        assert!(render_target.iter().all(|&p| p == UnsignedColor::new(60, 12, 136)));
    }

    #[test]
    fn blended_channels_are_rounded() {
        let mut renderer = full_screen_renderer(settings(2, 2, 0.3), UnsignedColor::new(10, 20, 30));
        renderer.render_frame().unwrap();
        let render_target = renderer.render_target().unwrap();
        assert!(render_target.iter().all(|&p| p == UnsignedColor::new(81, 10, 179)));
    }

    #[test]
    fn opaque_scene_is_kept_as_is() {
        let color = UnsignedColor::new(10, 20, 30);
        let mut renderer = full_screen_renderer(settings(3, 2, 1.0), color);
        renderer.render_frame().unwrap();
        assert!(renderer.render_target().unwrap().iter().all(|&p| p == color));
    }

    #[test]
    fn fully_transparent_scene_is_background() {
        let mut renderer = full_screen_renderer(settings(3, 2, 0.0), UnsignedColor::new(10, 20, 30));
        renderer.render_frame().unwrap();
        assert!(renderer.render_target().unwrap().iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn frames_are_repeatable() {
        let mut renderer = full_screen_renderer(settings(4, 4, 0.3), UnsignedColor::new(200, 100, 0));
        renderer.render_frame().unwrap();
        let first = renderer.render_target().unwrap().clone();
        renderer.update();
        renderer.render_frame().unwrap();
        assert_eq!(renderer.render_target().unwrap(), &first);
    }

    #[test]
    fn render_before_init_fails() {
        let mut renderer = RasterizationRenderer::new(Settings::default());
        assert!(matches!(renderer.render(), Err(Error::NotInitialized)));
    }

    #[test]
    fn invalid_settings_fail_init() {
        let mut renderer = RasterizationRenderer::new(settings(4, 4, 2.0));
        let result = renderer.init_with_model(full_screen_model(BACKGROUND));
        assert!(matches!(result, Err(Error::Settings(SettingsError::Invalid { .. }))));
        assert!(renderer.render_target().is_none());
    }

    #[test]
    fn missing_model_fails_init() {
        let directory = tempfile::tempdir().unwrap();
        let mut renderer = RasterizationRenderer::new(Settings {
            model_path: directory.path().join("missing.obj"),
            ..settings(4, 4, 1.0)
        });
        assert!(matches!(renderer.init(), Err(Error::Model(_))));
    }

    #[test]
    fn model_file_is_rendered_and_saved() {
        let directory = tempfile::tempdir().unwrap();
        let model_path = directory.path().join("triangle.obj");
        let result_path: PathBuf = directory.path().join("result.png");
        fs::write(
            &model_path,
            "mtllib triangle.mtl\nv -0.5 -0.5 -1\nv 0.5 -0.5 -1\nv 0 0.5 -1\nusemtl paint\nf 1 2 3\n",
        )
        .unwrap();
        fs::write(directory.path().join("triangle.mtl"), "newmtl paint\nKa 0.2 0.4 0.6\n").unwrap();

        let mut renderer = RasterizationRenderer::new(Settings {
            model_path,
            result_path: result_path.clone(),
            ..settings(16, 16, 1.0)
        });
        renderer.init().unwrap();
        renderer.render().unwrap();
        renderer.destroy();

        let image = image::open(&result_path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(image.get_pixel(8, 8), &image::Rgb([51, 102, 153]));
        assert_eq!(image.get_pixel(0, 0), &image::Rgb([111, 5, 243]));
    }
}
