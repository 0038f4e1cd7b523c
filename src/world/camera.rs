use nalgebra as na;
use na::{vector, Matrix4, Point3, Vector3};

/// Perspective camera, oriented by two angles.
/// theta turns the camera around the world y axis, phi tilts it up and down. Both angles and
/// the vertical angle of view are in degrees. With both angles at zero camera looks along -z.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vector3<f32>,
    theta: f32,
    phi: f32,
    angle_of_view: f32,
    z_near: f32,
    z_far: f32,
    width: f32,  // Viewport width, only the aspect ratio matters.
    height: f32, // Viewport height.
}

impl Default for Camera {
    fn default() -> Self {
        return Self {
            position: Vector3::zeros(),
            theta: 0.0,
            phi: 0.0,
            angle_of_view: 60.0,
            z_near: 0.001,
            z_far: 100.0,
            width: 1920.0,
            height: 1080.0,
        };
    }
}

impl Camera {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        log::trace!("Camera position set to {:?}", position);
    }

    pub fn set_theta(&mut self, theta: f32) {
        self.theta = theta;
        log::trace!("Camera theta set to {}", theta);
    }

    pub fn set_phi(&mut self, phi: f32) {
        self.phi = phi;
        log::trace!("Camera phi set to {}", phi);
    }

    pub fn set_angle_of_view(&mut self, angle_of_view: f32) {
        self.angle_of_view = angle_of_view;
        log::trace!("Camera angle of view set to {}", angle_of_view);
    }

    pub fn set_z_near(&mut self, z_near: f32) {
        self.z_near = z_near;
        log::trace!("Camera z near set to {}", z_near);
    }

    pub fn set_z_far(&mut self, z_far: f32) {
        self.z_far = z_far;
        log::trace!("Camera z far set to {}", z_far);
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
        log::trace!("Camera width set to {}", width);
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
        log::trace!("Camera height set to {}", height);
    }

    pub fn position(&self) -> Vector3<f32> {
        return self.position;
    }

    /// Unit vector the camera looks along.
    pub fn direction(&self) -> Vector3<f32> {
        let theta = self.theta.to_radians();
        let phi = self.phi.to_radians();
        return vector![theta.sin() * phi.cos(), phi.sin(), -theta.cos() * phi.cos()];
    }

    pub fn right(&self) -> Vector3<f32> {
        let right = self.direction().cross(&Vector3::y());
        if right.norm() < 1e-6 {
            // Looking straight up or down, yaw alone defines the right direction.
            let theta = self.theta.to_radians();
            return vector![theta.cos(), 0.0, theta.sin()];
        }
        return right.normalize();
    }

    pub fn up(&self) -> Vector3<f32> {
        return self.right().cross(&self.direction()).normalize();
    }

    /// World to camera space transform.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.direction());
        return Matrix4::look_at_rh(&eye, &target, &self.up());
    }

    /// Camera to clip space transform, NDC depth goes from -1 at z_near to 1 at z_far.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = self.width / self.height;
        return Matrix4::new_perspective(aspect, self.angle_of_view.to_radians(), self.z_near, self.z_far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{from_hom_point, to_hom_point};
    use approx::assert_relative_eq;

    fn project(camera: &Camera, point: Vector3<f32>) -> Vector3<f32> {
        let matrix = camera.projection_matrix() * camera.view_matrix();
        return from_hom_point(matrix * to_hom_point(point));
    }

    #[test]
    fn default_camera_looks_along_negative_z() {
        let camera = Camera::new();
        assert_relative_eq!(camera.direction(), vector![0.0, 0.0, -1.0], epsilon = 1e-6);
        assert_relative_eq!(camera.right(), vector![1.0, 0.0, 0.0], epsilon = 1e-6);
        assert_relative_eq!(camera.up(), vector![0.0, 1.0, 0.0], epsilon = 1e-6);
    }

    #[test]
    fn theta_turns_camera_around_y() {
        let mut camera = Camera::new();
        camera.set_theta(90.0);
        assert_relative_eq!(camera.direction(), vector![1.0, 0.0, 0.0], epsilon = 1e-6);
        camera.set_theta(0.0);
        camera.set_phi(90.0);
        assert_relative_eq!(camera.direction(), vector![0.0, 1.0, 0.0], epsilon = 1e-6);
        assert_relative_eq!(camera.right().norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn point_in_front_of_camera_projects_to_center() {
        let mut camera = Camera::new();
        camera.set_position(vector![1.0, 2.0, 3.0]);
        let ndc = project(&camera, vector![1.0, 2.0, -2.0]);
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn clip_planes_map_to_ndc_depth_range() {
        let mut camera = Camera::new();
        camera.set_z_near(1.0);
        camera.set_z_far(10.0);
        assert_relative_eq!(project(&camera, vector![0.0, 0.0, -1.0]).z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(project(&camera, vector![0.0, 0.0, -10.0]).z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn aspect_ratio_comes_from_viewport_size() {
        let mut camera = Camera::new();
        camera.set_width(200.0);
        camera.set_height(100.0);
        camera.set_angle_of_view(90.0);
        let projection = camera.projection_matrix();
        assert_relative_eq!(projection[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(projection[(1, 1)], 1.0, epsilon = 1e-6);
    }
}
