use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Import", inline)]
#[serde(default)]
/// What the importer loads and which commands it emits.
pub struct ImportBehavior {
    /// Emit mesh, surface and map commands.
    #[schemars(title = "Surfaces")]
    pub allow_surfaces: bool,
    /// Only decode the model; emit session-level commands but no
    /// representation commands.
    #[schemars(title = "State Script Only")]
    pub state_script: bool,
    /// Switch to movie mode when the session stores a movie.
    #[schemars(title = "Honour Movie")]
    pub honour_movie: bool,
    /// Keep branches saved as hidden (their atoms start hidden).
    #[schemars(title = "Load Hidden Objects")]
    pub load_hidden: bool,
}

impl Default for ImportBehavior {
    fn default() -> Self {
        Self {
            allow_surfaces: true,
            state_script: false,
            honour_movie: true,
            load_hidden: true,
        }
    }
}
