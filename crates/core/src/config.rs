//! Generation options.

use serde::{Deserialize, Serialize};

/// Parameters of the font-fit search and markup defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitOptions {
    /// Smallest size the search will return, fit or not.
    pub min_font_size: f64,

    /// Sizes above this shrink by `coarse_step`, others by `fine_step`.
    pub coarse_step_above: f64,
    pub coarse_step: f64,
    pub fine_step: f64,

    /// Inner padding per side. Usable width is `width - 2 * padding - 2`.
    pub padding: f64,

    /// Used when the slot markup declares no font size.
    pub default_font_size: f64,

    /// Used when the slot markup declares no font family.
    pub default_font_family: String,

    /// Text boxes fitted below this size get `tight_line_height`.
    pub tight_line_height_below: f64,
    pub tight_line_height: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_font_size: 10.0,
            coarse_step_above: 22.0,
            coarse_step: 2.0,
            fine_step: 1.0,
            padding: 10.0,
            default_font_size: 16.0,
            default_font_family: "Microsoft Yahei".to_string(),
            tight_line_height_below: 15.0,
            tight_line_height: 1.2,
        }
    }
}

impl FitOptions {
    /// Width available to text inside an element of the given outer width.
    pub fn usable_width(&self, width: f64) -> f64 {
        width - self.padding * 2.0 - 2.0
    }
}

/// What to do with a descriptor whose slide type has no template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTemplatePolicy {
    /// Yield an error for that descriptor; later descriptors still generate.
    #[default]
    Fail,
    /// Log a warning and produce no slide for that descriptor.
    Skip,
}

/// Options for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationOptions {
    pub fit: FitOptions,
    pub missing_template: MissingTemplatePolicy,
}

impl GenerationOptions {
    /// Create options with the default fit parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for slide types without templates.
    pub fn with_missing_template(mut self, policy: MissingTemplatePolicy) -> Self {
        self.missing_template = policy;
        self
    }

    /// Replace the fit parameters.
    pub fn with_fit(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// Set the fallback font family for slots whose markup names none.
    pub fn with_default_font_family(mut self, family: impl Into<String>) -> Self {
        self.fit.default_font_family = family.into();
        self
    }
}
