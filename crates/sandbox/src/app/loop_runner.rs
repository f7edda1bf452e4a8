use std::process::ExitCode;

use tileview::{run_app, AppError};
use tracing::error;

use super::bootstrap::{build_app, build_view, AppWiring};

pub(crate) fn run() -> ExitCode {
    if let Err(err) = build_app().and_then(run_wiring) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_wiring(app: AppWiring) -> Result<(), AppError> {
    let AppWiring {
        loop_config,
        view_config,
        world,
        atlas,
    } = app;
    run_app(loop_config, Box::new(world), move |model, viewport| {
        build_view(model, viewport, &view_config, atlas)
    })
}
