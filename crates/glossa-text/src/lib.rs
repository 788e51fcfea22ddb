//! glossa-text: font descriptions and resolution dependent font sizing.
//!
//! - `scaling`: scaling policies and the point size adjustment
//! - `font_desc`: named fonts as authored in language definitions

pub mod font_desc;
pub mod scaling;

pub use font_desc::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE, FontDesc, FontDescError};
pub use scaling::{
    DisplayMetrics, FontScalingConfig, REFERENCE_HEIGHT, REFERENCE_WIDTH, ScalingPolicy,
    SharedDisplay, UnknownScalingPolicy, adjust_font_size, scale_factor,
};
