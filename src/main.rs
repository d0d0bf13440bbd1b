use std::path::{Path, PathBuf};

use tracing::{info, warn};

use particle_scene::config::{
    load_scene_settings, load_scene_settings_from, save_scene_settings, SceneSettings,
};
use particle_scene::utils::logging::{init_logging, log_system_info, LOG_FILE};

fn main() -> anyhow::Result<()> {
    init_logging(Path::new(LOG_FILE))?;
    log_system_info();

    // Optional explicit settings file; otherwise the saved settings or defaults.
    let settings = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!("Loading scene settings from {:?}", path);
            load_scene_settings_from(&path)?
        }
        None => load_scene_settings().unwrap_or_else(|| {
            let settings = SceneSettings::default();
            if let Err(e) = save_scene_settings(&settings) {
                warn!("Could not save default settings: {}", e);
            }
            settings
        }),
    };
    settings.validate()?;

    info!("Starting {} {}", particle_scene::APP_NAME, particle_scene::VERSION);
    particle_scene::app::run(settings)
}
