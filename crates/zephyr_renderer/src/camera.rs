//! Camera for ray generation.

use rand::{Rng, RngCore};
use zephyr_math::{Quat, Ray, Vec3};

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 400,
            image_height: 400,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.set_resolution(width, height);
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialize();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.image_width = width;
        self.image_height = height;
        self.initialize();
    }

    /// Recompute the cached viewport after any parameter change.
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let aspect = self.image_width.max(1) as f32 / self.image_height.max(1) as f32;
        let viewport_width = viewport_height * aspect;

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / self.image_width.max(1) as f32;
        self.pixel_delta_v = viewport_v / self.image_height.max(1) as f32;

        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    /// Unit viewing direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    /// Unit vector pointing to the right of the image.
    pub fn right(&self) -> Vec3 {
        self.u
    }

    /// Unit vector pointing to the top of the image.
    pub fn up(&self) -> Vec3 {
        self.v
    }

    /// Move the eye and the target together.
    pub fn translate(&mut self, offset: Vec3) {
        self.look_from += offset;
        self.look_at += offset;
        self.initialize();
    }

    /// Turn the view direction around `vup` (yaw) and then around the
    /// camera's right vector (pitch). Angles are in radians.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        let direction = self.look_at - self.look_from;
        let yawed = Quat::from_axis_angle(self.vup.normalize(), yaw) * direction;
        let right = yawed.cross(self.vup).normalize();
        let turned = Quat::from_axis_angle(right, pitch) * yawed;

        // Refuse to pitch through the up vector, the basis would flip
        if turned.normalize().cross(self.vup).length_squared() > 1e-6 {
            self.look_at = self.look_from + turned;
        } else {
            self.look_at = self.look_from + yawed;
        }
        self.initialize();
    }

    /// Generate a ray for pixel (i, j) with random sampling.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5, 0.0)
}

/// Sample a random point in the unit disk.
fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
