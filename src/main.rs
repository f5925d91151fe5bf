use std::process::ExitCode;

use tracing::{error, info};

use onco1::api::{self, ApiState};
use onco1::common::config::AppCfg;
use onco1::common::log;
use onco1::model::FsArtefactRepo;
use onco1::PredictionService;

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match AppCfg::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            log::init("info");
            error!(module = "main", ev = "config_invalid", code = err.code as u32, error = %err);
            return ExitCode::FAILURE;
        }
    };
    log::init(&cfg.log_level);

    info!(
        module = "main",
        ev = "starting",
        feature_set = cfg.feature_set.as_str(),
        missing_policy = cfg.missing_policy.as_str(),
        fault_status = cfg.fault_status.as_u16(),
        model_dir = %cfg.model_dir.display(),
    );

    // No fallback: without both artefacts the service must not accept traffic.
    let repo = FsArtefactRepo::new(&cfg);
    let service = match PredictionService::from_config(&cfg, &repo) {
        Ok(service) => service,
        Err(err) => {
            error!(module = "main", ev = "startup_failed", code = err.code as u32, error = %err);
            return ExitCode::FAILURE;
        }
    };

    let state = ApiState::new(service, cfg.fault_status);
    match api::serve(cfg.bind_addr(), state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(module = "main", ev = "server_failed", code = err.code as u32, error = %err);
            ExitCode::FAILURE
        }
    }
}
