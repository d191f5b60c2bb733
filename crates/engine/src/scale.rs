//! Responsive pixel scaling.
//!
//! Apps are authored against a reference resolution. The scale factor is the
//! geometric interpolation between the width ratio and the height ratio of the
//! current viewport, floored at a minimum so small screens stay readable.

use serde::Deserialize;

/// Reference resolution and clamping for [`PxScale`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
	pub base_width: f32,
	pub base_height: f32,
	/// Lower bound for the computed scale.
	pub min_scale: f32,
	/// 0 scales by width only, 1 by height only.
	pub dominant_axis: f32,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			base_width: 1920.0,
			base_height: 1080.0,
			min_scale: 0.5,
			dominant_axis: 0.5,
		}
	}
}

impl ScaleConfig {
	/// Returns a description of the first invalid field, if any.
	pub fn invalid_reason(&self) -> Option<String> {
		if !is_positive(self.base_width) || !is_positive(self.base_height) {
			return Some(format!(
				"base resolution must be positive, got {}x{}",
				self.base_width, self.base_height
			));
		}
		if self.min_scale.is_nan() || self.min_scale < 0.0 {
			return Some(format!("min_scale must be non-negative, got {}", self.min_scale));
		}
		if !(0.0..=1.0).contains(&self.dominant_axis) {
			return Some(format!("dominant_axis must be within 0..=1, got {}", self.dominant_axis));
		}
		None
	}
}

fn is_positive(value: f32) -> bool {
	value.is_finite() && value > 0.0
}

/// Current scale factor handed to app factories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PxScale(f32);

impl Default for PxScale {
	fn default() -> Self {
		Self(1.0)
	}
}

impl PxScale {
	pub fn new(factor: f32) -> Self {
		Self(factor)
	}

	/// Computes the scale for a viewport, or `None` when the viewport has no area.
	pub fn compute(config: &ScaleConfig, width: f32, height: f32) -> Option<Self> {
		if !is_positive(width) || !is_positive(height) {
			return None;
		}
		if config.invalid_reason().is_some() {
			return None;
		}

		let w = (width / config.base_width).log2();
		let h = (height / config.base_height).log2();
		let centered = w + (h - w) * config.dominant_axis;
		Some(Self(centered.exp2().max(config.min_scale)))
	}

	pub fn factor(self) -> f32 {
		self.0
	}

	/// Scaled value rounded to whole pixels.
	pub fn px(self, value: f32) -> i32 {
		(value * self.0).round() as i32
	}

	/// Scaled value without rounding.
	pub fn scale(self, value: f32) -> f32 {
		value * self.0
	}

	/// Scaled value rounded to the nearest even pixel count.
	pub fn even(self, value: f32) -> i32 {
		(value * self.0 * 0.5).round() as i32 * 2
	}

	pub fn floor(self, value: f32) -> i32 {
		(value * self.0).floor() as i32
	}

	pub fn ceil(self, value: f32) -> i32 {
		(value * self.0).ceil() as i32
	}
}
