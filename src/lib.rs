pub mod codec;
pub mod config;
pub mod crop;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod image_state;
pub mod ingest;
pub mod logging;
pub mod presets;
pub mod remote;
pub mod session;
pub mod state;
pub use error::{AppError, AppResult};

use config::AppConfig;
use export::ExportService;
use remote::{EditOptions, GeminiEditClient};
use session::EditSessionController;

/// A ready-to-use session controller plus the exporter configured next to it.
pub struct Editor {
    pub session: EditSessionController<GeminiEditClient>,
    pub exporter: ExportService,
}

impl Editor {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let client = GeminiEditClient::from_config(config)?;
        let options = EditOptions {
            model: config.default_model,
            target_resolution: config.target_resolution,
        };
        let exporter =
            ExportService::with_default_paths(config.export_dir.as_deref(), config.export_prefix.as_str())?;
        Ok(Self {
            session: EditSessionController::with_options(client, options),
            exporter,
        })
    }
}

/// Entrypoint used by higher-level integrations: logging, config, client.
pub fn start() -> AppResult<Editor> {
    logging::init();
    let config = config::load_app_config();
    tracing::info!(
        model = ?config.default_model,
        api_base = %config.api_base,
        "starting promptedit"
    );
    let editor = Editor::from_config(&config)?;
    tracing::info!(state = ?editor.session.status(), "startup complete");
    Ok(editor)
}
