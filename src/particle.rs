use glam::Vec2;
use rand::Rng;

pub const OPACITY_DECAY: f32 = 0.015;
pub const RADIUS_DECAY: f32 = 0.05;
/// Radius only shrinks while above this, so it settles in (0.15, 0.2]
pub const SHRINK_THRESHOLD: f32 = 0.2;
/// A radius at or below this retires the particle
pub const RADIUS_FLOOR: f32 = 0.1;

/// Straight RGB colour, alpha is applied separately at draw time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

impl Rgba {
    /// Normalized `[r, g, b, a]` for the GPU
    pub fn to_array(self) -> [f32; 4] {
        let Rgb(r, g, b) = self.rgb;
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            self.alpha,
        ]
    }
}

pub const PALETTE: [Rgb; 2] = [Rgb(59, 130, 246), Rgb(16, 185, 129)];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Parallax depth, scales how far `velocity` carries the particle each tick
    pub z: f32,
    pub radius: f32,
    pub opacity: f32,
    pub color: Rgb,
}

impl Particle {
    pub fn sample<R: Rng + ?Sized>(position: Vec2, rng: &mut R) -> Self {
        let velocity = Vec2::new(rng.gen_range(-1f32..=1f32), rng.gen_range(-1f32..=1f32));
        let color = if rng.gen_bool(0.5) {
            PALETTE[0]
        } else {
            PALETTE[1]
        };

        Self {
            position,
            velocity,
            z: rng.gen_range(1f32..3f32),
            radius: rng.gen_range(1f32..4f32),
            opacity: 1.0,
            color,
        }
    }

    /// Draw colour with the current opacity as alpha
    pub fn rgba(&self) -> Rgba {
        Rgba {
            rgb: self.color,
            alpha: self.opacity.clamp(0.0, 1.0),
        }
    }
}

/// Moves and decays a particle by one frame.
pub fn advance(particle: &mut Particle) {
    particle.position += particle.velocity * particle.z;
    particle.opacity -= OPACITY_DECAY;
    if particle.radius > SHRINK_THRESHOLD {
        particle.radius -= RADIUS_DECAY;
    }
}

pub fn is_retired(particle: &Particle) -> bool {
    particle.opacity <= 0.0 || particle.radius <= RADIUS_FLOOR
}
