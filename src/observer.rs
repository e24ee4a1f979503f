//! Launch observers - where progress and LSX events end up

use std::fmt;

use crate::provider::{LsxEvent, OfferId};

/// Milestones reported while the launch sequence runs
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    ValidatingService,
    RegisteringService,
    EnsuringServiceRunning,
    StartingService,
    RequestingRegistrySetup,
    LoggingIn,
    Welcome(String),
    StartingLsx,
    LaunchingGame(OfferId),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::ValidatingService => write!(f, "Validating service..."),
            Progress::RegisteringService => write!(f, "Registering service..."),
            Progress::EnsuringServiceRunning => write!(f, "Ensuring service is running..."),
            Progress::StartingService => write!(f, "Starting service..."),
            Progress::RequestingRegistrySetup => write!(f, "Requesting registry setup"),
            Progress::LoggingIn => write!(f, "Logging in..."),
            Progress::Welcome(name) => write!(f, "Welcome {}!", name),
            Progress::StartingLsx => write!(f, "Starting LSX server..."),
            Progress::LaunchingGame(offer) => write!(f, "Launching game ({})...", offer),
        }
    }
}

pub trait LaunchObserver {
    fn on_progress(&mut self, progress: &Progress);

    fn on_event(&mut self, event: &LsxEvent);
}

/// Prints everything to stdout
pub struct ConsoleObserver;

impl LaunchObserver for ConsoleObserver {
    fn on_progress(&mut self, progress: &Progress) {
        println!("{}", progress);
    }

    fn on_event(&mut self, event: &LsxEvent) {
        println!("{}", format_event(event));
    }
}

pub fn format_event(event: &LsxEvent) -> String {
    format!("LSX Event: {} (pid {})", event.request, event.pid)
}
