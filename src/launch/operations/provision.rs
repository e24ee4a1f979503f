//! Background service and registry provisioning

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::launch::pure::{Backoff, check};
use crate::launch::types::{
    LaunchError, LaunchResult, ProvisioningPolicy, SettleStrategy,
};
use crate::observer::{LaunchObserver, Progress};
use crate::provider::{Operation, Provider};

/// Register the background service if the provider reports it invalid
pub fn ensure_service_registered<P: Provider>(
    provider: &P,
    policy: &ProvisioningPolicy,
    observer: &mut dyn LaunchObserver,
    rng: &mut fastrand::Rng,
) -> LaunchResult<()> {
    observer.on_progress(&Progress::ValidatingService);

    let valid = check(Operation::IsServiceValid, provider.is_service_valid(), || {
        provider.last_error()
    })?;
    if valid {
        debug!("background service already registered");
        return Ok(());
    }

    observer.on_progress(&Progress::RegisteringService);
    check(Operation::RegisterService, provider.register_service(), || {
        provider.last_error()
    })?;

    match policy.strategy {
        SettleStrategy::Fixed => {
            debug!(delay = ?policy.fixed_settle, "waiting for service registration");
            std::thread::sleep(policy.fixed_settle);
            Ok(())
        }
        SettleStrategy::Poll => {
            wait_until_ready(Operation::IsServiceValid, policy, rng, || {
                check(Operation::IsServiceValid, provider.is_service_valid(), || {
                    provider.last_error()
                })
            })
        }
    }
}

/// Start the background service if the provider reports it stopped
pub fn ensure_service_running<P: Provider>(
    provider: &P,
    runtime: &mut P::Runtime,
    policy: &ProvisioningPolicy,
    observer: &mut dyn LaunchObserver,
    rng: &mut fastrand::Rng,
) -> LaunchResult<()> {
    observer.on_progress(&Progress::EnsuringServiceRunning);

    let running = check(
        Operation::IsServiceRunning,
        provider.is_service_running(),
        || provider.last_error(),
    )?;
    if running {
        debug!("background service already running");
        return Ok(());
    }

    observer.on_progress(&Progress::StartingService);
    check(Operation::StartService, provider.start_service(runtime), || {
        provider.last_error()
    })?;

    if policy.strategy == SettleStrategy::Poll {
        wait_until_ready(Operation::IsServiceRunning, policy, rng, || {
            check(
                Operation::IsServiceRunning,
                provider.is_service_running(),
                || provider.last_error(),
            )
        })?;
    }

    Ok(())
}

/// Ask the service to set up the registry if the provider reports it invalid
pub fn ensure_registry<P: Provider>(
    provider: &P,
    runtime: &mut P::Runtime,
    observer: &mut dyn LaunchObserver,
) -> LaunchResult<()> {
    if provider.check_registry_validity() {
        debug!("registry already valid");
        return Ok(());
    }

    observer.on_progress(&Progress::RequestingRegistrySetup);
    check(
        Operation::RequestRegistrySetup,
        provider.request_registry_setup(runtime),
        || provider.last_error(),
    )
}

/// Re-run `query` with backoff until it reports ready or the policy times out.
///
/// A failing query aborts immediately.
pub fn wait_until_ready<F>(
    op: Operation,
    policy: &ProvisioningPolicy,
    rng: &mut fastrand::Rng,
    mut query: F,
) -> LaunchResult<()>
where
    F: FnMut() -> LaunchResult<bool>,
{
    let start = Instant::now();
    let mut backoff = Backoff::new(policy.initial_backoff, policy.max_backoff);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if query()? {
            info!(
                op = %op,
                attempts,
                elapsed = ?start.elapsed(),
                "service ready"
            );
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            warn!(op = %op, attempts, "gave up waiting for service");
            return Err(LaunchError::ProvisioningTimeout { op, waited: elapsed });
        }

        let remaining = policy.timeout - elapsed;
        let delay = backoff.next_delay(rng).min(remaining);
        debug!(op = %op, attempts, ?delay, "service not ready yet");
        std::thread::sleep(delay.max(Duration::from_millis(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockProvider, MockRuntime, RecordingObserver};
    use crate::provider::ResultCode;

    fn fast_poll() -> ProvisioningPolicy {
        ProvisioningPolicy {
            strategy: SettleStrategy::Poll,
            timeout: Duration::from_millis(200),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            fixed_settle: Duration::from_millis(1),
        }
    }

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(9)
    }

    #[test]
    fn valid_service_skips_registration() {
        let provider = MockProvider::new();
        let mut observer = RecordingObserver::new(provider.log());

        ensure_service_registered(&provider, &fast_poll(), &mut observer, &mut rng()).unwrap();

        assert_eq!(provider.calls(), vec![Operation::IsServiceValid]);
    }

    #[test]
    fn registration_polls_validity_until_true() {
        let provider = MockProvider::new().with_service_valid(&[false, false, false, true]);
        let mut observer = RecordingObserver::new(provider.log());

        ensure_service_registered(&provider, &fast_poll(), &mut observer, &mut rng()).unwrap();

        assert_eq!(
            provider.calls(),
            vec![
                Operation::IsServiceValid,
                Operation::RegisterService,
                Operation::IsServiceValid,
                Operation::IsServiceValid,
                Operation::IsServiceValid,
            ]
        );
    }

    #[test]
    fn fixed_settle_does_not_requery() {
        let provider = MockProvider::new().with_service_valid(&[false]);
        let mut observer = RecordingObserver::new(provider.log());
        let policy = ProvisioningPolicy {
            strategy: SettleStrategy::Fixed,
            ..fast_poll()
        };

        ensure_service_registered(&provider, &policy, &mut observer, &mut rng()).unwrap();

        assert_eq!(
            provider.calls(),
            vec![Operation::IsServiceValid, Operation::RegisterService]
        );
    }

    #[test]
    fn never_ready_times_out() {
        let provider = MockProvider::new().with_service_running(&[false]);
        let mut observer = RecordingObserver::new(provider.log());
        let policy = ProvisioningPolicy {
            timeout: Duration::from_millis(20),
            ..fast_poll()
        };

        let err = ensure_service_running(
            &provider,
            &mut MockRuntime,
            &policy,
            &mut observer,
            &mut rng(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LaunchError::ProvisioningTimeout {
                op: Operation::IsServiceRunning,
                ..
            }
        ));
        assert!(provider.called(Operation::StartService));
    }

    #[test]
    fn failing_query_during_poll_is_fatal() {
        let policy = fast_poll();
        let mut calls = 0;
        let err = wait_until_ready(Operation::IsServiceValid, &policy, &mut rng(), || {
            calls += 1;
            if calls < 3 {
                Ok(false)
            } else {
                Err(LaunchError::ProviderCode {
                    op: Operation::IsServiceValid,
                    code: ResultCode(1),
                })
            }
        })
        .unwrap_err();

        assert_eq!(calls, 3);
        assert!(matches!(err, LaunchError::ProviderCode { .. }));
    }

    #[test]
    fn running_service_is_left_alone() {
        let provider = MockProvider::new();
        let mut observer = RecordingObserver::new(provider.log());

        ensure_service_running(
            &provider,
            &mut MockRuntime,
            &fast_poll(),
            &mut observer,
            &mut rng(),
        )
        .unwrap();

        assert!(!provider.called(Operation::StartService));
    }

    #[test]
    fn registry_setup_only_when_invalid() {
        let provider = MockProvider::new();
        let mut observer = RecordingObserver::new(provider.log());
        ensure_registry(&provider, &mut MockRuntime, &mut observer).unwrap();
        assert!(!provider.called(Operation::RequestRegistrySetup));

        let provider = MockProvider::new().with_registry_valid(false);
        let mut observer = RecordingObserver::new(provider.log());
        ensure_registry(&provider, &mut MockRuntime, &mut observer).unwrap();
        assert!(provider.called(Operation::RequestRegistrySetup));
    }

    #[test]
    fn registration_failure_surfaces_last_error() {
        let provider = MockProvider::new().with_service_valid(&[false]).failing(
            Operation::RegisterService,
            ResultCode::CHECK_LAST_ERROR,
            Some("access denied"),
        );
        let mut observer = RecordingObserver::new(provider.log());

        let err = ensure_service_registered(&provider, &fast_poll(), &mut observer, &mut rng())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Function 'maxima_register_service' failed: access denied"
        );
    }
}
