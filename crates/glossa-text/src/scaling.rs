//! Resolution dependent font size adjustment.
//!
//! Authored point sizes target the reference resolution. The scaler converts
//! them for the current display using one of three policies, blended with a
//! configurable adjustment strength. Fonts never shrink below their authored
//! size.

use core::fmt;
use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Width in pixels of the resolution point sizes are authored against.
pub const REFERENCE_WIDTH: u32 = 800;
/// Height in pixels of the resolution point sizes are authored against.
pub const REFERENCE_HEIGHT: u32 = 600;

/// Ceiling applied to the Classic factor.
const CLASSIC_MAX_FACTOR: f32 = 2.0;
/// Widest aspect ratio the Balanced policy lets through.
const BALANCED_MAX_ASPECT: f32 = 2.0;
/// Tallest aspect ratio the Balanced policy lets through.
const BALANCED_MIN_ASPECT: f32 = 1.0;

/// How authored font sizes follow the display resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalingPolicy {
    /// Scale by display width only. Clamped to 2x.
    Classic,
    /// Scale by the smaller of the width and height ratios.
    Strict,
    /// Scale by the mean of the width and height ratios, with the aspect ratio
    /// limited to `1.0..=2.0`.
    #[default]
    Balanced,
}

impl ScalingPolicy {
    pub const ALL: [ScalingPolicy; 3] = [
        ScalingPolicy::Classic,
        ScalingPolicy::Strict,
        ScalingPolicy::Balanced,
    ];

    /// Configuration name of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalingPolicy::Classic => "CLASSIC",
            ScalingPolicy::Strict => "STRICT",
            ScalingPolicy::Balanced => "BALANCED",
        }
    }
}

impl fmt::Display for ScalingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy name that matches none of `CLASSIC`, `STRICT` or `BALANCED`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown font size method {0:?} (expected CLASSIC, STRICT or BALANCED)")]
pub struct UnknownScalingPolicy(pub String);

impl FromStr for ScalingPolicy {
    type Err = UnknownScalingPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ScalingPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownScalingPolicy(name.to_string()))
    }
}

impl Serialize for ScalingPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScalingPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Scaling settings loaded once per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontScalingConfig {
    pub policy: ScalingPolicy,
    /// Blend between no scaling (0.0) and the full computed factor (1.0).
    /// Values outside that range are used as given.
    pub adjustment_strength: f32,
}

impl Default for FontScalingConfig {
    fn default() -> Self {
        Self {
            policy: ScalingPolicy::Balanced,
            adjustment_strength: 0.7,
        }
    }
}

impl FontScalingConfig {
    pub fn new(policy: ScalingPolicy, adjustment_strength: f32) -> Self {
        Self {
            policy,
            adjustment_strength,
        }
    }

    /// Same strength with the policy pinned to Classic. Used for legacy content
    /// packages that upscale their fonts by hand.
    pub fn force_classic(self) -> Self {
        Self {
            policy: ScalingPolicy::Classic,
            ..self
        }
    }
}

/// Display size in pixels, sampled by the caller before each scaling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMetrics {
    pub width: u32,
    pub height: u32,
}

impl DisplayMetrics {
    pub const REFERENCE: DisplayMetrics = DisplayMetrics {
        width: REFERENCE_WIDTH,
        height: REFERENCE_HEIGHT,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn pack(self) -> u64 {
        (u64::from(self.width) << 32) | u64::from(self.height)
    }

    fn unpack(bits: u64) -> Self {
        Self {
            width: (bits >> 32) as u32,
            height: bits as u32,
        }
    }
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Current display size shared between a resize handler and layout code.
///
/// Width and height live in one atomic word, so a snapshot never mixes the
/// width of one resize with the height of another.
#[derive(Debug)]
pub struct SharedDisplay {
    bits: AtomicU64,
}

impl SharedDisplay {
    pub fn new(metrics: DisplayMetrics) -> Self {
        Self {
            bits: AtomicU64::new(metrics.pack()),
        }
    }

    pub fn store(&self, metrics: DisplayMetrics) {
        self.bits.store(metrics.pack(), Ordering::Release);
    }

    pub fn snapshot(&self) -> DisplayMetrics {
        DisplayMetrics::unpack(self.bits.load(Ordering::Acquire))
    }
}

impl Default for SharedDisplay {
    fn default() -> Self {
        Self::new(DisplayMetrics::REFERENCE)
    }
}

#[inline]
fn blend(full_factor: f32, strength: f32) -> f32 {
    1.0 + (full_factor - 1.0) * strength
}

/// Factor applied to authored sizes for `display`. Always `>= 1.0`.
pub fn scale_factor(config: &FontScalingConfig, display: DisplayMetrics) -> f32 {
    let strength = config.adjustment_strength;
    let ref_w = REFERENCE_WIDTH as f32;
    let ref_h = REFERENCE_HEIGHT as f32;

    let factor = match config.policy {
        ScalingPolicy::Classic => {
            let w_scale = display.width as f32 / ref_w;
            blend(w_scale, strength).min(CLASSIC_MAX_FACTOR)
        }
        ScalingPolicy::Strict => {
            let w_scale = display.width as f32 / ref_w;
            let h_scale = display.height as f32 / ref_h;
            blend(w_scale.min(h_scale), strength)
        }
        ScalingPolicy::Balanced => {
            let mut w = display.width as f32;
            let mut h = display.height as f32;
            let aspect = w / h;
            if aspect > BALANCED_MAX_ASPECT {
                w = BALANCED_MAX_ASPECT * h;
            } else if aspect < BALANCED_MIN_ASPECT {
                h = BALANCED_MIN_ASPECT * w;
            }
            let w_scale = w / ref_w;
            let h_scale = h / ref_h;
            blend((w_scale + h_scale) * 0.5, strength)
        }
    };

    factor.max(1.0)
}

/// Scale an authored point size for `display`, rounding down.
pub fn adjust_font_size(base_size: i32, config: &FontScalingConfig, display: DisplayMetrics) -> i32 {
    let factor = scale_factor(config, display);
    (base_size as f32 * factor).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(policy: ScalingPolicy, strength: f32) -> FontScalingConfig {
        FontScalingConfig::new(policy, strength)
    }

    #[test]
    fn defaults_are_balanced_at_seventy_percent() {
        let config = FontScalingConfig::default();
        assert_eq!(config.policy, ScalingPolicy::Balanced);
        assert_eq!(config.adjustment_strength, 0.7);
        assert_eq!(ScalingPolicy::default(), ScalingPolicy::Balanced);
    }

    #[test]
    fn classic_is_clamped_to_double() {
        let config = cfg(ScalingPolicy::Classic, 1.0);
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(4000, 600)), 24);
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(1600, 600)), 24);
    }

    #[test]
    fn classic_ignores_height() {
        let config = cfg(ScalingPolicy::Classic, 1.0);
        let short = adjust_font_size(10, &config, DisplayMetrics::new(1200, 100));
        let tall = adjust_font_size(10, &config, DisplayMetrics::new(1200, 5000));
        assert_eq!(short, 15);
        assert_eq!(short, tall);
    }

    #[test]
    fn strict_at_reference_keeps_authored_size() {
        for strength in [0.0, 0.3, 0.7, 1.0, 2.5, -4.0] {
            let config = cfg(ScalingPolicy::Strict, strength);
            assert_eq!(scale_factor(&config, DisplayMetrics::REFERENCE), 1.0);
            assert_eq!(adjust_font_size(17, &config, DisplayMetrics::REFERENCE), 17);
        }
    }

    #[test]
    fn strict_uses_smaller_ratio_without_ceiling() {
        let config = cfg(ScalingPolicy::Strict, 1.0);
        // 1920/800 = 2.4, 1080/600 = 1.8
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(1920, 1080)), 21);
        // 4x on both axes, beyond the Classic ceiling
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(3200, 2400)), 48);
    }

    #[test]
    fn balanced_ultra_wide_caps_width_contribution() {
        let config = cfg(ScalingPolicy::Balanced, 0.7);
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(3840, 1080)), 22);
    }

    #[test]
    fn balanced_aspect_two_uses_display_as_is() {
        let config = cfg(ScalingPolicy::Balanced, 1.0);
        // (2400/800 + 1200/600) / 2 = 2.5
        assert_eq!(scale_factor(&config, DisplayMetrics::new(2400, 1200)), 2.5);
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(2400, 1200)), 30);
    }

    #[test]
    fn balanced_portrait_caps_height_contribution() {
        let config = cfg(ScalingPolicy::Balanced, 1.0);
        // height recomputed as 1200: (1.5 + 2.0) / 2 = 1.75
        assert_eq!(adjust_font_size(12, &config, DisplayMetrics::new(1200, 1600)), 21);
    }

    #[test]
    fn never_shrinks_below_authored_size() {
        let displays = [
            DisplayMetrics::new(320, 240),
            DisplayMetrics::new(600, 1200),
            DisplayMetrics::new(1600, 600),
            DisplayMetrics::new(0, 0),
            DisplayMetrics::new(1024, 0),
            DisplayMetrics::new(0, 768),
        ];
        for policy in ScalingPolicy::ALL {
            for strength in [-1.0, 0.0, 0.7, 1.0] {
                for display in displays {
                    let config = cfg(policy, strength);
                    assert!(
                        adjust_font_size(12, &config, display) >= 12,
                        "{policy} {strength} {display:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn negative_strength_falls_back_to_floor() {
        let config = cfg(ScalingPolicy::Classic, -1.0);
        assert_eq!(scale_factor(&config, DisplayMetrics::new(1600, 1200)), 1.0);
    }

    #[test]
    fn zero_strength_disables_scaling() {
        for policy in ScalingPolicy::ALL {
            let config = cfg(policy, 0.0);
            assert_eq!(adjust_font_size(14, &config, DisplayMetrics::new(2560, 1440)), 14);
        }
    }

    #[test]
    fn repeated_calls_agree() {
        let config = FontScalingConfig::default();
        let display = DisplayMetrics::new(1024, 768);
        let first = adjust_font_size(12, &config, display);
        assert_eq!(first, 14);
        assert_eq!(first, adjust_font_size(12, &config, display));
    }

    #[test]
    fn force_classic_keeps_strength() {
        let config = cfg(ScalingPolicy::Balanced, 0.5).force_classic();
        assert_eq!(config.policy, ScalingPolicy::Classic);
        assert_eq!(config.adjustment_strength, 0.5);
        // 1 + (3840/800 - 1) * 0.5 = 2.9, clamped to 2.0
        assert_eq!(adjust_font_size(10, &config, DisplayMetrics::new(3840, 1080)), 20);
    }

    #[test]
    fn policy_names_parse_case_insensitively() {
        assert_eq!("classic".parse::<ScalingPolicy>(), Ok(ScalingPolicy::Classic));
        assert_eq!(" Strict ".parse::<ScalingPolicy>(), Ok(ScalingPolicy::Strict));
        assert_eq!("BALANCED".parse::<ScalingPolicy>(), Ok(ScalingPolicy::Balanced));
        assert_eq!(
            "linear".parse::<ScalingPolicy>(),
            Err(UnknownScalingPolicy("linear".into()))
        );
        assert_eq!(ScalingPolicy::Strict.to_string(), "STRICT");
    }

    #[test]
    fn shared_display_snapshot_is_never_torn() {
        use std::sync::Arc;

        // Each stored pair has height == width + 1, so a mixed snapshot shows.
        let shared = Arc::new(SharedDisplay::new(DisplayMetrics::new(0, 1)));
        let writer = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for width in 1..=20_000u32 {
                    shared.store(DisplayMetrics::new(width, width + 1));
                }
            })
        };

        let mut last_width = 0;
        while !writer.is_finished() {
            let snapshot = shared.snapshot();
            assert_eq!(snapshot.height, snapshot.width + 1, "{snapshot:?}");
            assert!(snapshot.width >= last_width);
            last_width = snapshot.width;
        }
        writer.join().unwrap();
        assert_eq!(shared.snapshot(), DisplayMetrics::new(20_000, 20_001));
    }

    #[test]
    fn shared_display_snapshot_follows_store() {
        let shared = SharedDisplay::default();
        assert_eq!(shared.snapshot(), DisplayMetrics::REFERENCE);
        shared.store(DisplayMetrics::new(3840, 2160));
        assert_eq!(shared.snapshot(), DisplayMetrics::new(3840, 2160));
    }
}
