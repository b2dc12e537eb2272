//! Configuration discovery, precedence, and loading.

pub mod discovery;
pub mod loader;
pub mod settings;
pub mod source;

pub use discovery::find_project_root;
pub use loader::{load_engine_settings, load_rules};
pub use settings::{EngineSettings, EngineSettingsFile};
pub use source::{ConfigSource, SourceKind};
