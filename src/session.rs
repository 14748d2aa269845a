use std::{sync::Arc, time::Duration};

use reqwest::Url;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    HostFilter, Rule, RuleSet,
    debounce::{DEFAULT_QUIET_INTERVAL, DebounceController},
    parser,
    projector::{self, Projection},
    settings::{EndpointKey, Settings},
    storage::KvStore,
    store::RuleStore,
    sync::{HttpTransport, SyncClient, SyncOutcome, Transport},
};

/// Whether the editor targets the active page's host or every host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Scoped,
    Global,
}

/// How rules are edited and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Editor {
    /// One row per rule with checkbox, key and value fields
    #[default]
    Table,
    /// One `key: value` line per rule in a textarea
    FreeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiMode {
    pub scope: Scope,
    pub editor: Editor,
}

/// Input raised by the editor UI
///
/// Row indices refer to positions in the full rule set, as returned by
/// [`SyncSession::visible_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Whole textarea content after a keystroke
    Text(String),
    Key { index: usize, key: String },
    Value { index: usize, value: String },
    Toggle { index: usize, enabled: bool },
    AddRow,
    RemoveRow { index: usize },
    SetAllEnabled(bool),
    SetEndpoint(String),
    SetDefaultEnabled(bool),
}

impl EditEvent {
    /// Continuous typing is debounced; discrete actions sync immediately
    #[must_use]
    pub fn is_debounced(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Key { .. } | Self::Value { .. })
    }
}

/// Work waiting for the quiet period to pass
#[derive(Debug)]
enum PendingEdit {
    /// Textarea content, parsed when the timer fires
    Text(String),
    /// Row fields already applied in memory
    Rows,
}

type EditListener = Box<dyn FnMut(&EditEvent, &RuleSet) + Send>;

/// Extract the hostname of a page URL, as the tab host resolver does
#[must_use]
pub fn host_from_url(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_owned)
}

/// Builder for [`SyncSession`]
///
/// # Example
///
/// ```ignore
/// let session = SessionBuilder::new()
///     .mode(UiMode { scope: Scope::Scoped, editor: Editor::FreeText })
///     .host("example.com")
///     .build(storage, SyncClient::builder().build()?);
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    mode: UiMode,
    host: String,
    quiet: Duration,
    endpoint_key: EndpointKey,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: UiMode::default(),
            host: String::new(),
            quiet: DEFAULT_QUIET_INTERVAL,
            endpoint_key: EndpointKey::default(),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: UiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Host of the active page; ignored in global scope
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Quiet interval before a burst of typing is synchronized
    #[must_use]
    pub fn quiet_interval(mut self, quiet: Duration) -> Self {
        self.quiet = quiet;
        self
    }

    /// Storage key holding the endpoint in this deployment
    #[must_use]
    pub fn endpoint_key(mut self, key: EndpointKey) -> Self {
        self.endpoint_key = key;
        self
    }

    /// Construct the session and load persisted rules
    ///
    /// No network traffic happens until [`SyncSession::activate`] or the first edit.
    pub fn build<T: Transport>(self, storage: Arc<dyn KvStore>, client: SyncClient<T>) -> SyncSession<T> {
        let store = RuleStore::new(Arc::clone(&storage));
        let settings = Settings::new(storage, self.endpoint_key);
        let host = match self.mode.scope {
            Scope::Scoped => self.host,
            Scope::Global => String::new(),
        };

        SyncSession {
            mode: self.mode,
            host,
            rules: store.load(),
            store,
            settings,
            client,
            debounce: DebounceController::new(self.quiet),
            listeners: Vec::new(),
            in_flight: Vec::new(),
        }
    }
}

/// One editing session over the persisted rule set
///
/// Owns the in-memory rules, the single pending debounce slot and the settings. All
/// mutation happens through `&mut self` on one task. POSTs run on spawned tasks and may
/// overlap; each one carries the full state, so the last to arrive wins.
pub struct SyncSession<T: Transport = HttpTransport> {
    mode: UiMode,
    host: String,
    rules: RuleSet,
    store: RuleStore,
    settings: Settings,
    client: SyncClient<T>,
    debounce: DebounceController<PendingEdit>,
    listeners: Vec<EditListener>,
    in_flight: Vec<JoinHandle<SyncOutcome>>,
}

impl<T: Transport> SyncSession<T> {
    #[must_use]
    pub fn mode(&self) -> UiMode {
        self.mode
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Rules the editor shows: the active host's in scoped mode, all in global mode
    #[must_use]
    pub fn filter(&self) -> HostFilter {
        match self.mode.scope {
            Scope::Scoped => HostFilter::only(self.host.clone()),
            Scope::Global => HostFilter::All,
        }
    }

    /// Textarea content for the free-text editor
    #[must_use]
    pub fn render_text(&self) -> String {
        parser::to_text(&self.rules, &self.filter())
    }

    /// Table rows with their index in the full rule set
    #[must_use]
    pub fn visible_rows(&self) -> Vec<(usize, &Rule)> {
        let filter = self.filter();
        self.rules.enumerate_matching(&filter).collect()
    }

    /// Enabled headers within the editor's scope
    #[must_use]
    pub fn projection(&self) -> Projection {
        projector::project(&self.rules, &self.filter())
    }

    /// Register a callback run after every applied edit, typically to re-render
    pub fn on_edit(&mut self, handler: impl FnMut(&EditEvent, &RuleSet) + Send + 'static) {
        self.listeners.push(Box::new(handler));
    }

    /// Push the persisted state once, without forcing a clear
    ///
    /// Nothing is sent when no rule is enabled.
    pub fn activate(&mut self) {
        info!(
            host = %self.host,
            rules = self.rules.len(),
            endpoint = %self.settings.endpoint(),
            default_enabled = self.settings.default_enabled(),
            "session activated"
        );
        self.dispatch(false);
    }

    /// Switch the active page host (scoped mode only)
    ///
    /// A pending textarea edit belongs to the previous host and is committed first.
    pub fn set_active_host(&mut self, host: impl Into<String>) {
        if self.mode.scope == Scope::Global {
            return;
        }
        if let Some(pending) = self.debounce.cancel() {
            self.on_quiet(pending);
        }
        self.host = host.into();
        debug!(host = %self.host, "active host changed");
    }

    /// Apply one edit event
    ///
    /// Typing events update memory and (re)start the quiet period. Structural events
    /// absorb any pending edit and sync right away. Settings events only persist.
    /// Typing events of the other editor (`Text` in the table, `Key`/`Value` in the
    /// textarea) are dropped without notifying listeners.
    pub fn handle(&mut self, event: EditEvent) {
        debug!(?event, "edit");
        if !self.accepts(&event) {
            warn!(?event, editor = ?self.mode.editor, "event does not belong to this editor, ignored");
            return;
        }

        match &event {
            EditEvent::Text(text) => {
                self.debounce.schedule(PendingEdit::Text(text.clone()));
            }
            EditEvent::Key { index, key } => {
                if self.edit_row(*index, |rule| rule.key = key.trim().to_owned()) {
                    self.schedule_rows();
                }
            }
            EditEvent::Value { index, value } => {
                if self.edit_row(*index, |rule| rule.value = value.trim().to_owned()) {
                    self.schedule_rows();
                }
            }
            EditEvent::Toggle { index, enabled } => {
                self.absorb_pending();
                if self.edit_row(*index, |rule| rule.enabled = *enabled) {
                    self.commit(true);
                }
            }
            EditEvent::AddRow => {
                self.absorb_pending();
                let enabled = self.settings.default_enabled();
                self.rules.push(Rule::new(self.host.clone(), "", "", enabled));
                self.commit(false);
            }
            EditEvent::RemoveRow { index } => {
                self.absorb_pending();
                match self.rules.remove(*index) {
                    Some(rule) => {
                        debug!(index, ?rule, "removed rule");
                        self.commit(true);
                    }
                    None => warn!(index, "remove for unknown row ignored"),
                }
            }
            EditEvent::SetAllEnabled(enabled) => {
                self.absorb_pending();
                self.rules.set_all_enabled(*enabled);
                if let Err(e) = self.settings.set_default_enabled(*enabled) {
                    error!(error = %e, "failed to persist default enabled state");
                }
                self.commit(true);
            }
            EditEvent::SetEndpoint(raw) => {
                if let Err(e) = self.settings.set_endpoint(raw) {
                    error!(error = %e, "failed to persist endpoint");
                }
            }
            EditEvent::SetDefaultEnabled(enabled) => {
                if let Err(e) = self.settings.set_default_enabled(*enabled) {
                    error!(error = %e, "failed to persist default enabled state");
                }
            }
        }

        for listener in &mut self.listeners {
            listener(&event, &self.rules);
        }
    }

    /// Wait for the pending quiet period and run the sync pipeline
    ///
    /// Returns `false` immediately when nothing is pending.
    pub async fn wait_quiet(&mut self) -> bool {
        if !self.debounce.is_pending() {
            return false;
        }
        let pending = self.debounce.fired().await;
        self.on_quiet(pending);
        true
    }

    /// Await every POST issued so far
    pub async fn settle(&mut self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight.len());
        for handle in self.in_flight.drain(..) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "sync task did not complete"),
            }
        }
        outcomes
    }

    /// Tear down: commit a pending edit now and await outstanding POSTs
    pub async fn close(mut self) -> Vec<SyncOutcome> {
        if let Some(pending) = self.debounce.cancel() {
            debug!("flushing pending edit on close");
            self.on_quiet(pending);
        }
        let outcomes = self.settle().await;
        info!(requests = outcomes.len(), "session closed");
        outcomes
    }

    /// Drive the session from `events` until every sender is dropped, then close
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<EditEvent>) -> Vec<SyncOutcome> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                pending = self.debounce.fired() => self.on_quiet(pending),
            }
        }
        self.close().await
    }

    /// Move the session onto its own task
    ///
    /// Returns the emitter feeding it and the task's handle, which resolves with the
    /// outcomes of the POSTs still in flight at close.
    pub fn spawn(self) -> (EditEmitter, JoinHandle<Vec<SyncOutcome>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (EditEmitter { tx }, handle)
    }

    fn edit_row(&mut self, index: usize, edit: impl FnOnce(&mut Rule)) -> bool {
        match self.rules.get_mut(index) {
            Some(rule) => {
                edit(rule);
                true
            }
            None => {
                warn!(index, "edit for unknown row ignored");
                false
            }
        }
    }

    /// Textarea input only in the free-text editor, row field input only in the table
    fn accepts(&self, event: &EditEvent) -> bool {
        match (self.mode.editor, event) {
            (Editor::Table, EditEvent::Text(_)) => false,
            (Editor::FreeText, EditEvent::Key { .. } | EditEvent::Value { .. }) => false,
            _ => true,
        }
    }

    fn schedule_rows(&mut self) {
        self.debounce.schedule(PendingEdit::Rows);
    }

    fn absorb_pending(&mut self) {
        if let Some(PendingEdit::Text(text)) = self.debounce.cancel() {
            self.apply_text(&text);
        }
    }

    fn apply_text(&mut self, text: &str) {
        let parsed = parser::from_text(text, &self.host);
        debug!(host = %self.host, rules = parsed.len(), "applying text edit");
        let filter = self.filter();
        self.rules.replace_matching(&filter, parsed);
    }

    fn on_quiet(&mut self, pending: PendingEdit) {
        if let PendingEdit::Text(text) = pending {
            self.apply_text(&text);
        }
        self.commit(true);
    }

    fn commit(&mut self, force: bool) {
        if let Err(e) = self.store.save(&self.rules) {
            error!(error = %e, "failed to persist rules");
        }
        self.dispatch(force);
    }

    fn dispatch(&mut self, force: bool) {
        // the service replaces its whole table on each POST, so always send every host
        let mut projection = projector::project(&self.rules, &HostFilter::All);
        if force && !self.host.is_empty() {
            projection.include_host(&self.host);
        }

        self.in_flight.retain(|handle| !handle.is_finished());

        let client = self.client.clone();
        let endpoint = self.settings.endpoint();
        self.in_flight.push(tokio::spawn(async move {
            client.sync(&projection, &endpoint, force).await
        }));
    }
}

/// Sending half of a spawned session's event loop
#[derive(Debug, Clone)]
pub struct EditEmitter {
    tx: mpsc::UnboundedSender<EditEvent>,
}

impl EditEmitter {
    /// Queue an event, `false` once the session has shut down
    pub fn emit(&self, event: EditEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
