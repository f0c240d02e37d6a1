use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

/// Straight RGB with a separate alpha channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Composites over black, which is what the terminal background is.
    pub fn over_black(self) -> (u8, u8, u8) {
        let scale = |c: u8| (c as f32 * self.a).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub phase_speed: f32,
    pub amplitude: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Rgba,
    pub pulse: Option<Pulse>,
}

impl Particle {
    /// Radius as drawn at `time`; the stored radius never changes.
    pub fn display_radius(&self, time: f64) -> f32 {
        match self.pulse {
            Some(pulse) => {
                let phase = (time * pulse.phase_speed as f64).rem_euclid(std::f64::consts::TAU);
                self.radius * (1.0 + pulse.amplitude * phase.sin() as f32)
            }
            None => self.radius,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub opacity: f32,
    pub color: Rgba,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sparkle {
    pub pos: Vec2,
    pub size: f32,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        (0.0..=self.width).contains(&pos.x) && (0.0..=self.height).contains(&pos.y)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FieldStats {
    pub particles: usize,
    pub edges: usize,
    pub sparkles: usize,
    pub time: u64,
    pub mean_speed: f32,
    pub mean_edge_length: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length(), 5.0);
        }

        #[test]
        fn distance_is_symmetric() {
            let a = Vec2::new(1.0, 1.0);
            let b = Vec2::new(4.0, 5.0);
            assert_eq!(a.distance(b), 5.0);
            assert_eq!(b.distance(a), 5.0);
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn add_and_sub_assign() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            assert_eq!(a, Vec2::new(4.0, 6.0));
            a -= Vec2::new(1.0, 1.0);
            assert_eq!(a, Vec2::new(3.0, 5.0));
        }

        #[test]
        fn scalar_multiplication_commutes() {
            let v = Vec2::new(2.0, 3.0);
            assert_eq!(v * 2.0, 2.0 * v);
            assert_eq!(v * 0.0, Vec2::ZERO);
        }
    }

    mod rgba {
        use super::*;

        #[test]
        fn with_alpha_clamps() {
            let c = Rgba::opaque(10, 20, 30);
            assert_eq!(c.with_alpha(2.0).a, 1.0);
            assert_eq!(c.with_alpha(-1.0).a, 0.0);
        }

        #[test]
        fn over_black_scales_channels() {
            let c = Rgba::opaque(200, 100, 50).with_alpha(0.5);
            assert_eq!(c.over_black(), (100, 50, 25));
        }
    }

    mod particle_display_radius {
        use super::*;

        fn particle(pulse: Option<Pulse>) -> Particle {
            Particle {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                radius: 2.0,
                color: Rgba::opaque(255, 255, 255),
                pulse,
            }
        }

        #[test]
        fn without_pulse_is_static() {
            let p = particle(None);
            assert_eq!(p.display_radius(0.0), 2.0);
            assert_eq!(p.display_radius(123.0), 2.0);
        }

        #[test]
        fn pulse_stays_positive() {
            let p = particle(Some(Pulse {
                phase_speed: 0.05,
                amplitude: 0.3,
            }));
            for t in 0..1000 {
                assert!(p.display_radius(t as f64) > 0.0);
            }
        }

        #[test]
        fn pulse_keeps_moving_after_millions_of_ticks() {
            let p = particle(Some(Pulse {
                phase_speed: 0.05,
                amplitude: 0.3,
            }));
            let late = 16_777_216.0;
            assert_ne!(p.display_radius(late), p.display_radius(late + 1.0));
        }
    }

    mod viewport {
        use super::*;

        #[test]
        fn rejects_degenerate_sizes() {
            assert!(!Viewport::new(0.0, 600.0).is_valid());
            assert!(!Viewport::new(800.0, -1.0).is_valid());
            assert!(!Viewport::new(f32::NAN, 600.0).is_valid());
            assert!(Viewport::new(800.0, 600.0).is_valid());
        }

        #[test]
        fn contains_includes_edges() {
            let vp = Viewport::new(10.0, 5.0);
            assert!(vp.contains(Vec2::new(0.0, 0.0)));
            assert!(vp.contains(Vec2::new(10.0, 5.0)));
            assert!(!vp.contains(Vec2::new(10.1, 5.0)));
        }
    }
}
