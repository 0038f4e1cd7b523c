use nalgebra as na;
use na::{vector, Vector3, Vector4};

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a point from homogenous coordinates, i.e. the perspective divide.
pub fn from_hom_point(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w];
}

/// Color used while shading, channels are expected to be in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        return Self { r, g, b };
    }

    /// Color with the exact value of an 8-bit storage color.
    pub fn from_unsigned(color: UnsignedColor) -> Self {
        return Self {
            r: color.r as f32 / 255.0,
            g: color.g as f32 / 255.0,
            b: color.b as f32 / 255.0,
        };
    }
}

/// Struct, representing raw rgb8 pixel data as it is stored in the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnsignedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl UnsignedColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        return Self { r, g, b };
    }

    /// Get convex combination of two colors: t * c_1 + (1 - t) * c_2, rounded per channel.
    /// Halfway values round to even, so t = 1 and t = 0 reproduce c_1 and c_2 exactly.
    pub fn blend(color_1: UnsignedColor, color_2: UnsignedColor, t: f32) -> UnsignedColor {
        fn mix(a: u8, b: u8, t: f32) -> u8 {
            let value = a as f32 * t + b as f32 * (1.0 - t);
            return value.round_ties_even().clamp(0.0, 255.0) as u8;
        }

        return UnsignedColor {
            r: mix(color_1.r, color_2.r, t),
            g: mix(color_1.g, color_2.g, t),
            b: mix(color_1.b, color_2.b, t),
        };
    }
}

impl From<Color> for UnsignedColor {
    /// Quantization of a shading color, out of range channels are saturated.
    fn from(color: Color) -> Self {
        fn quantize(channel: f32) -> u8 {
            return (channel * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        return UnsignedColor {
            r: quantize(color.r),
            g: quantize(color.g),
            b: quantize(color.b),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn homogeneous_round_trip_divides_by_w() {
        let p = from_hom_point(vector![2.0, 4.0, -6.0, 2.0]);
        assert_relative_eq!(p, vector![1.0, 2.0, -3.0]);
        assert_relative_eq!(to_hom_point(p), vector![1.0, 2.0, -3.0, 1.0]);
    }

    #[test]
    fn unsigned_colors_survive_quantization() {
        for value in [0u8, 1, 10, 20, 30, 127, 128, 254, 255] {
            let color = UnsignedColor::new(value, value, value);
            assert_eq!(UnsignedColor::from(Color::from_unsigned(color)), color);
        }
    }

    #[test]
    fn quantization_saturates() {
        let color = UnsignedColor::from(Color::new(-0.5, 2.0, 0.5));
        assert_eq!(color, UnsignedColor::new(0, 255, 128));
    }

    #[test]
    fn blend_endpoints_are_exact() {
        let scene = UnsignedColor::new(10, 20, 30);
        let background = UnsignedColor::new(111, 5, 243);
        assert_eq!(UnsignedColor::blend(scene, background, 1.0), scene);
        assert_eq!(UnsignedColor::blend(scene, background, 0.0), background);
    }

    #[test]
    fn blend_halfway() {
        let scene = UnsignedColor::new(10, 20, 30);
        let background = UnsignedColor::new(111, 5, 243);
        assert_eq!(
            UnsignedColor::blend(scene, background, 0.5),
            UnsignedColor::new(60, 12, 136)
        );
    }

    #[test]
    fn blend_rounds_to_nearest() {
        let scene = UnsignedColor::new(10, 20, 30);
        let background = UnsignedColor::new(111, 5, 243);
        // 80.7, 9.5 and 179.1 before rounding.
        assert_eq!(
            UnsignedColor::blend(scene, background, 0.3),
            UnsignedColor::new(81, 10, 179)
        );
        assert_eq!(
            UnsignedColor::blend(UnsignedColor::new(100, 200, 0), UnsignedColor::new(0, 0, 0), 0.999),
            UnsignedColor::new(100, 200, 0)
        );
    }
}
