use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "View", inline)]
#[serde(default)]
/// Target viewport used when reconstructing the saved camera.
pub struct ViewOptions {
    /// Width over height of the target viewport.
    #[schemars(title = "Aspect Ratio", range(min = 0.1, max = 10.0), extend("step" = 0.05))]
    pub aspect_ratio: f32,
    /// Field of view of the target renderer in degrees.
    #[schemars(title = "Field of View", range(min = 5.0, max = 120.0), extend("step" = 1.0))]
    pub field_of_view: f32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            field_of_view: 20.0,
        }
    }
}
