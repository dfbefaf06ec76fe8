//! Separable blend functions on 0-255 channel values.

/// Per-channel blend function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendFn {
    /// Source replaces destination.
    #[default]
    Normal,
    /// Darkens: `src * dst`.
    Multiply,
    /// Lightens: inverse of multiplying the inverses.
    Screen,
    /// Multiply or screen, keyed on the destination.
    Overlay,
    /// Multiply or screen, keyed on the source.
    HardLight,
    /// Gentle contrast on normalized channels.
    SoftLight,
}

impl BlendFn {
    /// Look up a blend function by name (`"normal"`, `"hardLight"`, `"soft-light"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "normal" => Some(Self::Normal),
            "multiply" => Some(Self::Multiply),
            "screen" => Some(Self::Screen),
            "overlay" => Some(Self::Overlay),
            "hardlight" => Some(Self::HardLight),
            "softlight" => Some(Self::SoftLight),
            _ => None,
        }
    }

    /// Blend one channel. Inputs and output are in `0.0..=255.0`.
    #[must_use]
    pub fn apply(self, src: f32, dst: f32) -> f32 {
        match self {
            Self::Normal => src,
            Self::Multiply => 255.0 * (src / 255.0 * dst / 255.0),
            Self::Screen => 255.0 * (1.0 - (1.0 - src / 255.0) * (1.0 - dst / 255.0)),
            Self::Overlay => mix_keyed(dst, src, dst),
            Self::HardLight => mix_keyed(src, src, dst),
            Self::SoftLight => {
                let s = src / 255.0;
                let d = dst / 255.0;
                255.0 * ((1.0 - 2.0 * s) * d * d + 2.0 * s * d)
            }
        }
    }
}

/// Multiply below mid-gray, screen above; `key` picks the branch.
#[inline]
fn mix_keyed(key: f32, src: f32, dst: f32) -> f32 {
    if key <= 127.0 {
        2.0 * src * dst / 255.0
    } else {
        255.0 - 2.0 * (255.0 - src) * (255.0 - dst) / 255.0
    }
}

/// Blend function plus opacity, as requested for a draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blending {
    pub func: BlendFn,
    /// Overall opacity in `[0, 1]`, multiplied with the source alpha.
    pub opacity: f32,
}

impl Blending {
    /// Create a blending mode, clamping opacity into `[0, 1]`.
    #[must_use]
    pub fn new(func: BlendFn, opacity: f32) -> Self {
        let opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        Self { func, opacity }
    }

    /// Normal blending at the given opacity.
    #[must_use]
    pub fn with_opacity(opacity: f32) -> Self {
        Self::new(BlendFn::Normal, opacity)
    }
}

impl Default for Blending {
    fn default() -> Self {
        Self {
            func: BlendFn::Normal,
            opacity: 1.0,
        }
    }
}

impl From<BlendFn> for Blending {
    fn from(func: BlendFn) -> Self {
        Self::new(func, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_normal_returns_source() {
        assert!(approx(BlendFn::Normal.apply(12.0, 200.0), 12.0));
    }

    #[test]
    fn test_multiply_and_screen_extremes() {
        assert!(approx(BlendFn::Multiply.apply(255.0, 80.0), 80.0));
        assert!(approx(BlendFn::Multiply.apply(0.0, 80.0), 0.0));
        assert!(approx(BlendFn::Screen.apply(0.0, 80.0), 80.0));
        assert!(approx(BlendFn::Screen.apply(255.0, 80.0), 255.0));
    }

    #[test]
    fn test_overlay_keys_on_destination() {
        // dark destination: multiply branch
        assert!(approx(BlendFn::Overlay.apply(255.0, 100.0), 200.0));
        // light destination: screen branch
        assert!(approx(BlendFn::Overlay.apply(0.0, 200.0), 145.0));
    }

    #[test]
    fn test_hard_light_is_overlay_with_operands_swapped() {
        for (s, d) in [(30.0, 220.0), (200.0, 40.0), (127.0, 128.0), (255.0, 0.0)] {
            assert!(approx(BlendFn::HardLight.apply(s, d), BlendFn::Overlay.apply(d, s)));
        }
    }

    #[test]
    fn test_soft_light_bounds() {
        assert!(approx(BlendFn::SoftLight.apply(0.0, 255.0), 255.0));
        assert!(approx(BlendFn::SoftLight.apply(255.0, 0.0), 0.0));
        let mid = BlendFn::SoftLight.apply(127.5, 100.0);
        assert!(approx(mid, 100.0));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BlendFn::from_name("hardLight"), Some(BlendFn::HardLight));
        assert_eq!(BlendFn::from_name("soft-light"), Some(BlendFn::SoftLight));
        assert_eq!(BlendFn::from_name("NORMAL"), Some(BlendFn::Normal));
        assert_eq!(BlendFn::from_name("dodge"), None);
    }

    #[test]
    fn test_blending_clamps_opacity() {
        assert!(approx(Blending::new(BlendFn::Screen, 3.0).opacity, 1.0));
        assert!(approx(Blending::with_opacity(-1.0).opacity, 0.0));
        assert!(approx(Blending::new(BlendFn::Normal, f32::NAN).opacity, 1.0));
        assert_eq!(Blending::from(BlendFn::Multiply).func, BlendFn::Multiply);
    }
}
