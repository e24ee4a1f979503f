//! One-shot commands outside the launch sequence

use std::path::PathBuf;

use tracing::info;

use crate::launch::pure::check;
use crate::launch::types::LaunchResult;
use crate::provider::{Operation, Provider};

/// Install path of a game the provider knows about
pub fn read_game_path<P: Provider>(provider: &P, name: &str) -> LaunchResult<PathBuf> {
    check(Operation::InitLogger, provider.init_logger(), || {
        provider.last_error()
    })?;
    check(Operation::ReadGamePath, provider.read_game_path(name), || {
        provider.last_error()
    })
}

/// Stop the provider's background service
pub fn stop_background_service<P: Provider>(provider: &P) -> LaunchResult<()> {
    check(Operation::InitLogger, provider.init_logger(), || {
        provider.last_error()
    })?;
    let mut runtime = check(Operation::CreateRuntime, provider.create_runtime(), || {
        provider.last_error()
    })?;
    check(Operation::StopService, provider.stop_service(&mut runtime), || {
        provider.last_error()
    })?;
    info!("background service stopped");
    Ok(())
}
