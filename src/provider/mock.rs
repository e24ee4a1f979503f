//! Scripted in-memory provider used by tests
//!
//! Every entry point appends to a shared [`Record`] log so tests can assert
//! call order, including the interleaving with observer output.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{
    AccessToken, EventBatchView, LsxEvent, OfferId, Operation, Provider, ProviderFault,
    ProviderResult, ResultCode,
};
use crate::observer::{LaunchObserver, Progress};

#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Call(Operation),
    Progress(Progress),
    Emitted(LsxEvent),
}

pub type RecordLog = Arc<Mutex<Vec<Record>>>;

pub struct MockRuntime;

#[derive(Default)]
pub struct MockSession {
    token: Option<AccessToken>,
    logged_in: bool,
}

pub struct MockBatch {
    pub id: usize,
    events: Vec<LsxEvent>,
}

impl EventBatchView for MockBatch {
    fn len(&self) -> usize {
        self.events.len()
    }

    fn events(&self) -> Vec<LsxEvent> {
        self.events.clone()
    }
}

#[derive(Default)]
struct State {
    failures: HashMap<Operation, (ResultCode, Option<String>)>,
    unsupported: Vec<Operation>,
    service_valid: VecDeque<bool>,
    service_running: VecDeque<bool>,
    registry_valid: bool,
    batches: VecDeque<Vec<LsxEvent>>,
    consume_limit: Option<usize>,
    consumed: usize,
    released: Vec<usize>,
    last_error: Option<String>,
    lsx_port: Option<u16>,
}

pub struct MockProvider {
    state: Mutex<State>,
    log: RecordLog,
}

impl MockProvider {
    /// Everything already provisioned; every call succeeds
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                service_valid: VecDeque::from([true]),
                service_running: VecDeque::from([true]),
                registry_valid: true,
                ..State::default()
            }),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers for successive validity queries; the last one repeats
    pub fn with_service_valid(self, answers: &[bool]) -> Self {
        self.state.lock().unwrap().service_valid = answers.iter().copied().collect();
        self
    }

    /// Answers for successive running queries; the last one repeats
    pub fn with_service_running(self, answers: &[bool]) -> Self {
        self.state.lock().unwrap().service_running = answers.iter().copied().collect();
        self
    }

    pub fn with_registry_valid(self, valid: bool) -> Self {
        self.state.lock().unwrap().registry_valid = valid;
        self
    }

    /// Make `op` return `code`, leaving `message` behind the last-error accessor
    pub fn failing(self, op: Operation, code: ResultCode, message: Option<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, (code, message.map(str::to_string)));
        self
    }

    pub fn without(self, op: Operation) -> Self {
        self.state.lock().unwrap().unsupported.push(op);
        self
    }

    /// Batches handed out by successive fetches; empty batches afterwards
    pub fn with_batches(self, batches: Vec<Vec<LsxEvent>>) -> Self {
        self.state.lock().unwrap().batches = batches.into();
        self
    }

    /// Fetches beyond `limit` fail with an opaque code
    pub fn with_consume_limit(self, limit: usize) -> Self {
        self.state.lock().unwrap().consume_limit = Some(limit);
        self
    }

    pub fn log(&self) -> RecordLog {
        self.log.clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Call(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    pub fn called(&self, op: Operation) -> bool {
        self.calls().contains(&op)
    }

    pub fn consumed(&self) -> usize {
        self.state.lock().unwrap().consumed
    }

    pub fn released(&self) -> Vec<usize> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn lsx_port(&self) -> Option<u16> {
        self.state.lock().unwrap().lsx_port
    }

    fn enter(&self, op: Operation) -> ProviderResult<()> {
        self.log.lock().unwrap().push(Record::Call(op));
        let mut state = self.state.lock().unwrap();
        if state.unsupported.contains(&op) {
            return Err(ProviderFault::Unsupported);
        }
        if let Some((code, message)) = state.failures.get(&op).cloned() {
            state.last_error = message;
            return Err(ProviderFault::Code(code));
        }
        Ok(())
    }
}

fn next_answer(answers: &mut VecDeque<bool>) -> bool {
    if answers.len() > 1 {
        answers.pop_front().unwrap_or(true)
    } else {
        answers.front().copied().unwrap_or(true)
    }
}

impl Provider for MockProvider {
    type Runtime = MockRuntime;
    type Session = MockSession;
    type EventBatch = MockBatch;

    fn last_error(&self) -> Option<String> {
        self.log
            .lock()
            .unwrap()
            .push(Record::Call(Operation::GetLastError));
        self.state.lock().unwrap().last_error.clone()
    }

    fn init_logger(&self) -> ProviderResult<()> {
        self.enter(Operation::InitLogger)
    }

    fn create_runtime(&self) -> ProviderResult<MockRuntime> {
        self.enter(Operation::CreateRuntime)?;
        Ok(MockRuntime)
    }

    fn is_service_valid(&self) -> ProviderResult<bool> {
        self.enter(Operation::IsServiceValid)?;
        Ok(next_answer(&mut self.state.lock().unwrap().service_valid))
    }

    fn is_service_running(&self) -> ProviderResult<bool> {
        self.enter(Operation::IsServiceRunning)?;
        Ok(next_answer(&mut self.state.lock().unwrap().service_running))
    }

    fn register_service(&self) -> ProviderResult<()> {
        self.enter(Operation::RegisterService)
    }

    fn start_service(&self, _runtime: &mut MockRuntime) -> ProviderResult<()> {
        self.enter(Operation::StartService)
    }

    fn stop_service(&self, _runtime: &mut MockRuntime) -> ProviderResult<()> {
        self.enter(Operation::StopService)
    }

    fn check_registry_validity(&self) -> bool {
        self.log
            .lock()
            .unwrap()
            .push(Record::Call(Operation::CheckRegistryValidity));
        self.state.lock().unwrap().registry_valid
    }

    fn request_registry_setup(&self, _runtime: &mut MockRuntime) -> ProviderResult<()> {
        self.enter(Operation::RequestRegistrySetup)
    }

    fn login(&self, _runtime: &mut MockRuntime) -> ProviderResult<AccessToken> {
        self.enter(Operation::Login)?;
        Ok(AccessToken::new("browser-token"))
    }

    fn login_manual(
        &self,
        _runtime: &mut MockRuntime,
        session: &mut MockSession,
        _persona: &str,
        _password: &str,
    ) -> ProviderResult<()> {
        self.enter(Operation::LoginManual)?;
        session.logged_in = true;
        Ok(())
    }

    fn access_token(
        &self,
        _runtime: &mut MockRuntime,
        session: &mut MockSession,
    ) -> ProviderResult<AccessToken> {
        self.enter(Operation::AccessToken)?;
        if !session.logged_in {
            return Err(ProviderFault::Code(ResultCode::NOT_LOGGED_IN));
        }
        Ok(AccessToken::new("stored-token"))
    }

    fn create_session(&self) -> MockSession {
        self.log
            .lock()
            .unwrap()
            .push(Record::Call(Operation::CreateSession));
        MockSession::default()
    }

    fn set_access_token(
        &self,
        _runtime: &mut MockRuntime,
        session: &mut MockSession,
        token: &AccessToken,
    ) -> ProviderResult<()> {
        self.enter(Operation::SetAccessToken)?;
        session.token = Some(token.clone());
        Ok(())
    }

    fn set_lsx_port(
        &self,
        _runtime: &mut MockRuntime,
        _session: &mut MockSession,
        port: u16,
    ) -> ProviderResult<()> {
        self.enter(Operation::SetLsxPort)?;
        self.state.lock().unwrap().lsx_port = Some(port);
        Ok(())
    }

    fn start_lsx(&self, _runtime: &mut MockRuntime, _session: &mut MockSession) -> ProviderResult<()> {
        self.enter(Operation::StartLsx)
    }

    fn consume_events(
        &self,
        _runtime: &mut MockRuntime,
        _session: &mut MockSession,
    ) -> ProviderResult<MockBatch> {
        self.enter(Operation::ConsumeEvents)?;
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.consume_limit {
            if state.consumed >= limit {
                return Err(ProviderFault::Code(ResultCode::UNKNOWN));
            }
        }
        let events = state.batches.pop_front().unwrap_or_default();
        let id = state.consumed;
        state.consumed += 1;
        Ok(MockBatch { id, events })
    }

    fn free_events(&self, batch: MockBatch) {
        self.log
            .lock()
            .unwrap()
            .push(Record::Call(Operation::FreeEvents));
        self.state.lock().unwrap().released.push(batch.id);
    }

    fn find_owned_offer(
        &self,
        _runtime: &mut MockRuntime,
        session: &mut MockSession,
        slug: &str,
    ) -> ProviderResult<OfferId> {
        self.enter(Operation::FindOwnedOffer)?;
        if session.token.is_none() {
            return Err(ProviderFault::Code(ResultCode::NOT_LOGGED_IN));
        }
        Ok(OfferId::new(format!("Origin.OFR.{}", slug)))
    }

    fn display_name(
        &self,
        _runtime: &mut MockRuntime,
        session: &mut MockSession,
    ) -> ProviderResult<String> {
        self.enter(Operation::GetDisplayName)?;
        if session.token.is_none() {
            return Err(ProviderFault::Code(ResultCode::NOT_LOGGED_IN));
        }
        Ok("Player".to_string())
    }

    fn launch_game(
        &self,
        _runtime: &mut MockRuntime,
        _session: &mut MockSession,
        _offer: &OfferId,
    ) -> ProviderResult<()> {
        self.enter(Operation::LaunchGame)
    }

    fn take_foreground_focus(&self) -> ProviderResult<()> {
        self.enter(Operation::TakeForegroundFocus)
    }

    fn read_game_path(&self, name: &str) -> ProviderResult<PathBuf> {
        self.enter(Operation::ReadGamePath)?;
        Ok(PathBuf::from("/games").join(name))
    }
}

/// Observer that writes into a provider's record log
pub struct RecordingObserver {
    log: RecordLog,
}

impl RecordingObserver {
    pub fn new(log: RecordLog) -> Self {
        Self { log }
    }
}

impl LaunchObserver for RecordingObserver {
    fn on_progress(&mut self, progress: &Progress) {
        self.log
            .lock()
            .unwrap()
            .push(Record::Progress(progress.clone()));
    }

    fn on_event(&mut self, event: &LsxEvent) {
        self.log.lock().unwrap().push(Record::Emitted(event.clone()));
    }
}
