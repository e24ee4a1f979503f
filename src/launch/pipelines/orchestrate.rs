//! Launch sequence pipeline

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::launch::operations::{ensure_registry, ensure_service_registered, ensure_service_running};
use crate::launch::pure::{check, is_valid_transition};
use crate::launch::types::{LaunchResult, LaunchRequest, LaunchState, LoginMethod, PumpOptions};
use crate::observer::{LaunchObserver, Progress};
use crate::provider::{AccessToken, OfferId, Operation, Provider, ProviderFault, ProviderResult};

use super::subscription::{Subscription, subscribe};

/// How often the consumer wakes up to check whether it should stop
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// A game the provider has launched, with the handles still needed for events
pub struct LaunchedGame<P: Provider> {
    pub offer: OfferId,
    runtime: P::Runtime,
    session: P::Session,
}

/// Drives a provider through the launch sequence, failing fast
pub struct Orchestrator<'o, P: Provider, O: LaunchObserver> {
    provider: Arc<P>,
    observer: &'o mut O,
    state: LaunchState,
    rng: fastrand::Rng,
}

impl<'o, P, O> Orchestrator<'o, P, O>
where
    P: Provider + 'static,
    O: LaunchObserver,
{
    pub fn new(provider: Arc<P>, observer: &'o mut O) -> Self {
        Self {
            provider,
            observer,
            state: LaunchState::Uninitialized,
            rng: fastrand::Rng::new(),
        }
    }

    /// Seed the backoff jitter
    #[cfg(test)]
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Run every step up to and including the game launch
    pub fn launch(&mut self, request: &LaunchRequest) -> LaunchResult<LaunchedGame<P>> {
        let result = self.run(request);
        if let Err(err) = &result {
            error!(state = ?self.state, error = %err, "launch aborted");
            self.advance(LaunchState::Failed);
        }
        result
    }

    /// Deliver events to the observer until `should_stop` returns true or
    /// the stream fails
    pub fn pump_events<F>(
        &mut self,
        game: LaunchedGame<P>,
        options: PumpOptions,
        should_stop: F,
    ) -> LaunchResult<()>
    where
        F: Fn() -> bool,
    {
        self.advance(LaunchState::Polling);
        info!(offer = %game.offer, "streaming LSX events");
        let mut subscription = subscribe(self.provider.clone(), game.runtime, game.session, options);

        let result = self.consume(&mut subscription, should_stop);
        subscription.stop();
        if let Err(err) = &result {
            error!(error = %err, "event stream failed");
            self.advance(LaunchState::Failed);
        }
        result
    }

    fn consume<F>(&mut self, subscription: &mut Subscription, should_stop: F) -> LaunchResult<()>
    where
        F: Fn() -> bool,
    {
        loop {
            if should_stop() {
                info!("stop requested");
                return Ok(());
            }
            if let Some(event) = subscription.recv_timeout(STOP_CHECK_INTERVAL)? {
                self.observer.on_event(&event);
            }
        }
    }

    fn run(&mut self, request: &LaunchRequest) -> LaunchResult<LaunchedGame<P>> {
        let provider = self.provider.clone();
        let provider = provider.as_ref();

        self.call(Operation::InitLogger, provider.init_logger())?;

        let mut runtime = self.call(Operation::CreateRuntime, provider.create_runtime())?;
        self.advance(LaunchState::RuntimeReady);

        let policy = &request.provisioning;
        ensure_service_registered(provider, policy, &mut *self.observer, &mut self.rng)?;
        ensure_service_running(provider, &mut runtime, policy, &mut *self.observer, &mut self.rng)?;
        self.advance(LaunchState::ServiceReady);

        ensure_registry(provider, &mut runtime, &mut *self.observer)?;
        self.advance(LaunchState::RegistryReady);

        self.observer.on_progress(&Progress::LoggingIn);
        let (token, mut session) = match &request.login {
            LoginMethod::Browser => {
                let token = self.call(Operation::Login, provider.login(&mut runtime))?;
                if request.focus_after_login {
                    self.call(
                        Operation::TakeForegroundFocus,
                        provider.take_foreground_focus(),
                    )?;
                }
                (token, provider.create_session())
            }
            LoginMethod::Credentials { persona, password } => {
                let mut session = provider.create_session();
                self.call(
                    Operation::LoginManual,
                    provider.login_manual(&mut runtime, &mut session, persona, password),
                )?;
                let token: AccessToken = self.call(
                    Operation::AccessToken,
                    provider.access_token(&mut runtime, &mut session),
                )?;
                (token, session)
            }
        };
        self.advance(LaunchState::Authenticated);

        self.call(
            Operation::SetAccessToken,
            provider.set_access_token(&mut runtime, &mut session, &token),
        )?;
        self.advance(LaunchState::SessionBound);

        let name = self.call(
            Operation::GetDisplayName,
            provider.display_name(&mut runtime, &mut session),
        )?;
        self.observer.on_progress(&Progress::Welcome(name));

        let offer = self.call(
            Operation::FindOwnedOffer,
            provider.find_owned_offer(&mut runtime, &mut session, &request.slug),
        )?;
        debug!(slug = %request.slug, offer = %offer, "resolved owned offer");

        if let Some(port) = request.lsx_port {
            self.call(
                Operation::SetLsxPort,
                provider.set_lsx_port(&mut runtime, &mut session, port),
            )?;
        }

        self.observer.on_progress(&Progress::StartingLsx);
        self.call(
            Operation::StartLsx,
            provider.start_lsx(&mut runtime, &mut session),
        )?;
        self.advance(LaunchState::Streaming);

        self.observer
            .on_progress(&Progress::LaunchingGame(offer.clone()));
        self.call(
            Operation::LaunchGame,
            provider.launch_game(&mut runtime, &mut session, &offer),
        )?;
        self.advance(LaunchState::Launched);

        Ok(LaunchedGame {
            offer,
            runtime,
            session,
        })
    }

    fn call<T>(&self, op: Operation, result: ProviderResult<T>) -> LaunchResult<T> {
        match &result {
            Ok(_) => debug!(op = %op, "provider call succeeded"),
            Err(ProviderFault::Code(code)) => {
                debug!(op = %op, code = %code, meaning = code.meaning(), "provider call failed")
            }
            Err(ProviderFault::Unsupported) => debug!(op = %op, "provider export missing"),
        }
        check(op, result, || self.provider.last_error())
    }

    fn advance(&mut self, to: LaunchState) {
        debug_assert!(
            is_valid_transition(self.state, to),
            "invalid launch transition {:?} -> {:?}",
            self.state,
            to
        );
        info!(from = ?self.state, to = ?to, "launch state changed");
        self.state = to;
    }
}
