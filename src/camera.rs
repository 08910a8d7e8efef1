use cubit_geom::{Mat4, Vec3};

pub struct FpsCamera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub move_speed: f32,
}

impl FpsCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: -15.0,
            move_speed: 24.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();
        Vec3::new(
            yaw_rad.cos() * pitch_rad.cos(),
            pitch_rad.sin(),
            yaw_rad.sin() * pitch_rad.cos(),
        )
        .normalized()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::UP).normalized()
    }

    /// Flies along the horizontal heading; pitch only affects the view.
    pub fn advance(&mut self, dt: f32) {
        let f = self.forward();
        let heading = Vec3::new(f.x, 0.0, f.z);
        if heading.length() > 0.0 {
            self.position += heading.normalized() * self.move_speed * dt;
        }
    }
}

pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    /// Degrees per second.
    pub spin: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 30.0,
            spin: 10.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.clamp(-89.0, 89.0).to_radians();
        self.target
            + Vec3::new(
                yaw_rad.cos() * pitch_rad.cos(),
                pitch_rad.sin(),
                yaw_rad.sin() * pitch_rad.cos(),
            ) * self.distance
    }

    pub fn advance(&mut self, dt: f32) {
        self.yaw = (self.yaw + self.spin * dt) % 360.0;
    }
}

/// The closed set of camera controllers.
pub enum Camera {
    Fps(FpsCamera),
    Orbit(OrbitCamera),
}

impl Camera {
    pub fn position(&self) -> Vec3 {
        match self {
            Camera::Fps(c) => c.position,
            Camera::Orbit(c) => c.position(),
        }
    }

    pub fn target(&self) -> Vec3 {
        match self {
            Camera::Fps(c) => c.position + c.forward(),
            Camera::Orbit(c) => c.target,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target(), Vec3::UP)
    }

    pub fn view_proj(&self, fov_degrees: f32, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(fov_degrees.to_radians(), aspect, 0.1, 4096.0);
        proj * self.view_matrix()
    }

    pub fn advance(&mut self, dt: f32) {
        match self {
            Camera::Fps(c) => c.advance(dt),
            Camera::Orbit(c) => c.advance(dt),
        }
    }
}
