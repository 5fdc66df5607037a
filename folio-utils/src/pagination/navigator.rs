//! The interactive navigator.
//!
//! A navigator posts one page at a time on a [`Surface`], keeps the visible
//! controls in sync with its buttons and dispatches control presses one at a
//! time until it idles out, is cancelled, or loses its root surface.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::FutureExt;
use indexmap::IndexMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use super::button::{Button, Press, Signal};
use super::buttons::default_buttons;
use super::events::{EventHub, Subscription, SurfaceEvent};
use super::embed::{EmbedError, EmbedGenerator, embed_pages};
use super::page::{Page, PageView, wrap_index};
use super::paginator::{DEFAULT_MAX_CHARS, Paginator, PaginatorError};
use super::reconcile::{apply_plan, plan_reconciliation};
use super::surface::{ActorId, Surface, SurfaceError, SurfaceId};
use crate::cleanup::{CleanupAction, apply_cleanup};

/// Default idle timeout for a navigator session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default wait for a follow-up text reply inside a button callback.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

const LOADING_PLACEHOLDER: &str = "Loading...";

const PERMISSION_NOTICE: &str = "I lack the required permissions to display this content.\n\n\
    At the very least, I require the ability to **manage messages** and **add reactions**.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Idle timeout. Resets after every dispatched press.
    pub timeout: Duration,
    /// Zero-based page shown first. Wraps like any other index.
    pub initial_page: usize,
    /// Prefix pages with `[n/N]` when it fits.
    pub show_page_number: bool,
    /// Upper bound on rendered characters.
    pub max_content_chars: usize,
    pub reply_timeout: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            initial_page: 0,
            show_page_number: true,
            max_content_chars: DEFAULT_MAX_CHARS,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

/// Who started the navigator, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Default owner. Always allowed to press controls.
    pub author: ActorId,
    /// The message that triggered the navigator, if any.
    pub message: Option<SurfaceId>,
    /// Whether other actors can see the navigator at all.
    pub shared: bool,
}

impl Invocation {
    pub fn new(author: ActorId) -> Self {
        Self {
            author,
            message: None,
            shared: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    TimedOut,
    /// A button callback asked to stop.
    Cancelled,
    /// [`NavigatorHandle::kill`] was called.
    Killed,
    RootDeleted,
    PermissionDenied,
    Fault,
}

/// How a navigator ended and what was cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    pub reason: TerminationReason,
    pub cleanup: CleanupAction,
}

#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    #[error("cannot navigate an empty set of pages")]
    EmptyPages,
    #[error("page {index} is empty")]
    EmptyPage { index: usize },
    #[error("the idle timeout must be positive")]
    InvalidTimeout,
    #[error("control symbol {0:?} is registered more than once")]
    DuplicateSymbol(String),
    #[error("page number {number} is outside 1..={total}")]
    PageOutOfRange { number: usize, total: usize },
    #[error("this navigator has already been started")]
    AlreadyStarted,
    #[error(transparent)]
    Pagination(#[from] PaginatorError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error("navigator loop failed: {0}")]
    Fault(#[source] anyhow::Error),
}

/// A follow-up text message captured by [`NavigatorState::await_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub surface: SurfaceId,
    pub actor: ActorId,
    pub content: String,
}

/// Mutable state of one navigator, handed to button callbacks.
pub struct NavigatorState {
    surface: Arc<dyn Surface>,
    pages: Arc<Vec<Page>>,
    buttons: IndexMap<String, Button>,
    config: NavigatorConfig,
    invocation: Invocation,
    owner: Option<ActorId>,
    page_index: usize,
    /// Root first, then every additional surface still alive.
    surfaces: Vec<SurfaceId>,
    dirty: bool,
    root_deleted: bool,
    events: Option<Subscription>,
    /// Presses that arrived while a callback was waiting for a reply.
    pending: VecDeque<Press>,
}

impl fmt::Debug for NavigatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorState")
            .field("pages", &self.pages.len())
            .field("buttons", &self.buttons.keys().collect::<Vec<_>>())
            .field("page_index", &self.page_index)
            .field("owner", &self.owner)
            .field("surfaces", &self.surfaces)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl NavigatorState {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Move to a page, wrapping out-of-range and negative indices.
    pub fn set_page_index(&mut self, index: isize) {
        let next = wrap_index(index, self.pages.len());
        if next != self.page_index {
            self.page_index = next;
            self.dirty = true;
        }
    }

    /// Move relative to the current page, wrapping at both ends.
    pub fn offset_page(&mut self, delta: isize) {
        let current = isize::try_from(self.page_index).unwrap_or(isize::MAX);
        self.set_page_index(current.saturating_add(delta));
    }

    /// One-based page number.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Jump to a one-based page number. Unlike the index setter this does not wrap.
    pub fn set_page_number(&mut self, number: usize) -> Result<(), NavigatorError> {
        let total = self.pages.len();
        if number == 0 || number > total {
            return Err(NavigatorError::PageOutOfRange { number, total });
        }

        if number - 1 != self.page_index {
            self.page_index = number - 1;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.page_index)
    }

    /// Whether a redraw is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn self_actor(&self) -> ActorId {
        self.surface.self_actor()
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    /// Hand control to another actor. `None` lets anyone press controls.
    pub fn set_owner(&mut self, owner: Option<ActorId>) {
        self.owner = owner;
    }

    /// Restrict control to the invocation author.
    pub fn lock(&mut self) {
        self.owner = Some(self.invocation.author);
    }

    pub fn unlock(&mut self) {
        self.owner = None;
    }

    /// Registered buttons in display order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.buttons.values()
    }

    pub fn button(&self, symbol: &str) -> Option<&Button> {
        self.buttons.get(symbol)
    }

    /// Change a button's symbol without moving it in the display order.
    ///
    /// Returns `false` when `from` is unknown or `to` is taken by another button.
    pub fn rekey_button(&mut self, from: &str, to: impl Into<String>) -> bool {
        let to = to.into();
        if self.buttons.contains_key(&to) {
            return from == to;
        }

        let Some(index) = self.buttons.get_index_of(from) else {
            return false;
        };
        let Some((_, mut button)) = self.buttons.shift_remove_index(index) else {
            return false;
        };

        button.set_symbol(to.clone());
        self.buttons.shift_insert(index, to, button);
        true
    }

    pub fn root(&self) -> Option<SurfaceId> {
        self.surfaces.first().copied()
    }

    /// Additional surfaces still tracked for cleanup.
    pub fn additional_surfaces(&self) -> &[SurfaceId] {
        self.surfaces.get(1..).unwrap_or_default()
    }

    /// Rough number of bytes held by the page list.
    pub fn page_bytes(&self) -> usize {
        self.pages
            .iter()
            .map(Page::approximate_bytes)
            .sum()
    }

    /// Post an additional surface that is removed when the navigator cleans up.
    pub async fn send(&mut self, content: &str) -> Result<SurfaceId, SurfaceError> {
        let surface = self.surface.render(content).await?;
        self.surfaces.push(surface);
        Ok(surface)
    }

    /// Post a surface the navigator does not track.
    pub async fn notify(&self, content: &str) -> Result<SurfaceId, SurfaceError> {
        self.surface.render(content).await
    }

    /// Post an untracked surface and delete it once `lifetime` has passed.
    pub async fn flash(&self, content: &str, lifetime: Duration) -> Result<SurfaceId, SurfaceError> {
        let flashed = self.surface.render(content).await?;
        let surface = Arc::clone(&self.surface);
        tokio::spawn(async move {
            time::sleep(lifetime).await;
            if let Err(source) = surface.delete(flashed).await {
                debug!(?source, surface = flashed, "could not delete flashed surface");
            }
        });
        Ok(flashed)
    }

    /// Whether `actor` is a bot account, this navigator's own included.
    pub async fn is_bot(&self, actor: ActorId) -> Result<bool, SurfaceError> {
        self.surface.is_bot(actor).await
    }

    /// Best-effort delete of a non-root surface.
    pub async fn discard(&mut self, surface: SurfaceId) {
        if self.root() == Some(surface) {
            return;
        }

        self.surfaces.retain(|tracked| *tracked != surface);
        if let Err(source) = self.surface.delete(surface).await {
            debug!(?source, surface, "could not discard surface");
        }
    }

    /// Wait for `actor` to post a message in the navigator's scope.
    ///
    /// Presses arriving meanwhile are queued for later dispatch. Returns `None`
    /// on timeout or when the root surface disappears.
    pub async fn await_reply(&mut self, actor: ActorId, timeout: Duration) -> Option<Reply> {
        let scope = self.surface.scope();
        let deadline = Instant::now() + timeout;

        loop {
            let events = self.events.as_mut()?;
            let event = time::timeout_at(deadline, events.recv()).await.ok()??;

            match event {
                SurfaceEvent::Reply {
                    scope: reply_scope,
                    surface,
                    actor: author,
                    content,
                } if reply_scope == scope && author == actor => {
                    return Some(Reply {
                        surface,
                        actor,
                        content,
                    });
                }
                other => {
                    if let Some(press) = self.absorb(other) {
                        self.pending.push_back(press);
                    }
                    if self.root_deleted {
                        return None;
                    }
                }
            }
        }
    }

    fn render_current(&self) -> PageView {
        self.current_page()
            .map(|page| {
                page.view(
                    self.page_number(),
                    self.page_count(),
                    self.config.show_page_number,
                    self.config.max_content_chars,
                )
            })
            .unwrap_or_default()
    }

    /// Whether `actor` may press `symbol` right now.
    fn accepts(&self, actor: ActorId, symbol: &str) -> bool {
        actor != self.surface.self_actor()
            && self.buttons.contains_key(symbol)
            && (self.owner.is_none_or(|owner| owner == actor) || actor == self.invocation.author)
    }

    /// Fold one event into the state, returning a press aimed at the root.
    fn absorb(&mut self, event: SurfaceEvent) -> Option<Press> {
        let root = self.root()?;

        match event {
            SurfaceEvent::ControlPressed {
                surface,
                symbol,
                actor,
            } if surface == root => Some(Press {
                surface,
                symbol,
                actor,
            }),
            SurfaceEvent::SurfaceDeleted { surface } if surface == root => {
                self.root_deleted = true;
                None
            }
            SurfaceEvent::SurfaceDeleted { surface } => {
                self.surfaces.retain(|tracked| *tracked != surface);
                None
            }
            _ => None,
        }
    }

    /// Wait for the next press this navigator accepts.
    ///
    /// Rejected presses are stripped from the root and never end the wait.
    async fn next_press(&mut self) -> Option<Press> {
        while let Some(press) = self.pending.pop_front() {
            if self.accepts(press.actor, &press.symbol) {
                return Some(press);
            }
            self.reject(&press).await;
        }

        loop {
            let event = match self.events.as_mut() {
                Some(events) => events.recv().await,
                None => None,
            };
            let Some(event) = event else {
                return std::future::pending().await;
            };

            if let Some(press) = self.absorb(event) {
                if self.accepts(press.actor, &press.symbol) {
                    return Some(press);
                }
                self.reject(&press).await;
            }
            if self.root_deleted {
                return None;
            }
        }
    }

    async fn reject(&self, press: &Press) {
        debug!(symbol = %press.symbol, actor = press.actor, "ignoring control press");
        if press.actor == self.surface.self_actor() {
            return;
        }

        if let Err(source) = self
            .surface
            .remove_control(press.surface, &press.symbol, Some(press.actor))
            .await
        {
            debug!(?source, symbol = %press.symbol, "could not strip ignored control press");
        }
    }

    async fn redraw(&mut self) -> Result<(), Halt> {
        let root = self.root().ok_or(SurfaceError::NotFound)?;
        let view = self.render_current();
        self.surface.edit(root, &view).await?;
        self.dirty = false;
        Ok(())
    }

    async fn reconcile(&self) -> Result<(), Halt> {
        let root = self.root().ok_or(SurfaceError::NotFound)?;

        let mut expected = Vec::with_capacity(self.buttons.len());
        for button in self.buttons.values() {
            if button.should_show(self).await {
                expected.push(button.symbol().to_owned());
            }
        }

        let rendered = self.surface.list_controls(root).await?;
        let ops = plan_reconciliation(&rendered, &expected);
        apply_plan(self.surface.as_ref(), root, &ops).await?;
        Ok(())
    }

    async fn dispatch_next(&mut self) -> Result<(), Halt> {
        let Some(press) = self.next_press().await else {
            return Err(Stop::root_deleted().into());
        };

        let Some(button) = self.buttons.get(&press.symbol).cloned() else {
            return Ok(());
        };

        debug!(
            surface = press.surface,
            symbol = %press.symbol,
            actor = press.actor,
            button = button.name(),
            "dispatching control press"
        );
        let signal = button.invoke(self, &press).await.map_err(Stop::fault)?;

        if self.root_deleted {
            return Err(Stop::root_deleted().into());
        }

        match signal {
            Signal::Continue => Ok(()),
            Signal::Cancel(cleanup) => Err(Stop::new(TerminationReason::Cancelled, cleanup).into()),
        }
    }

    async fn run(&mut self, phase: &watch::Sender<Phase>) -> Result<Infallible, Halt> {
        let root = self.surface.render(LOADING_PLACEHOLDER).await?;
        self.surfaces.push(root);
        self.redraw().await?;

        phase.send_replace(Phase::Running);
        info!(
            root,
            pages = self.page_count(),
            author = self.invocation.author,
            "navigator started"
        );

        loop {
            self.reconcile().await?;

            match time::timeout(self.config.timeout, self.dispatch_next()).await {
                Ok(dispatched) => dispatched?,
                Err(_) => {
                    return Err(Stop::new(TerminationReason::TimedOut, CleanupAction::ON_TIMEOUT).into());
                }
            }

            if self.dirty {
                self.redraw().await?;
            }
        }
    }

    async fn drive(&mut self, phase: &watch::Sender<Phase>) -> Stop {
        let halt = match self.run(phase).await {
            Ok(never) => match never {},
            Err(halt) => halt,
        };

        match halt {
            Halt::Stop(stop) => stop,
            Halt::Surface(SurfaceError::NotFound) => Stop::root_deleted(),
            Halt::Surface(SurfaceError::Forbidden) => {
                warn!(
                    root = ?self.root(),
                    author = self.invocation.author,
                    "missing permissions to drive navigator"
                );
                if let Err(source) = self.surface.render(PERMISSION_NOTICE).await {
                    warn!(?source, "could not report missing permissions");
                }
                Stop::new(TerminationReason::PermissionDenied, CleanupAction::REMOVE_ALL_SENT)
            }
            Halt::Surface(SurfaceError::Transport(source)) => Stop::fault(source),
        }
    }

    async fn finish(
        mut self,
        stop: Stop,
        phase: &watch::Sender<Phase>,
    ) -> Result<Termination, NavigatorError> {
        let Stop { termination, fault } = stop;

        if let Some(source) = &fault {
            error!(?source, root = ?self.root(), "navigator loop failed");
        }
        info!(
            reason = ?termination.reason,
            cleanup = ?termination.cleanup,
            root = ?self.root(),
            "navigator finished"
        );

        apply_cleanup(
            self.surface.as_ref(),
            termination.cleanup,
            &self.surfaces,
            self.invocation.message,
        )
        .await;

        if let Some(mut events) = self.events.take() {
            events.unsubscribe();
        }
        phase.send_replace(Phase::Finished);

        match fault {
            Some(source) => Err(NavigatorError::Fault(source)),
            None => Ok(termination),
        }
    }
}

/// A terminal decision reached by the loop.
struct Stop {
    termination: Termination,
    fault: Option<anyhow::Error>,
}

impl Stop {
    fn new(reason: TerminationReason, cleanup: CleanupAction) -> Self {
        Self {
            termination: Termination { reason, cleanup },
            fault: None,
        }
    }

    fn root_deleted() -> Self {
        Self::new(TerminationReason::RootDeleted, CleanupAction::REMOVE_NON_ROOT)
    }

    fn fault(source: anyhow::Error) -> Self {
        Self {
            termination: Termination {
                reason: TerminationReason::Fault,
                cleanup: CleanupAction::REMOVE_ALL_SENT,
            },
            fault: Some(source),
        }
    }
}

/// Why a loop step bailed out.
enum Halt {
    Surface(SurfaceError),
    Stop(Stop),
}

impl From<SurfaceError> for Halt {
    fn from(source: SurfaceError) -> Self {
        Self::Surface(source)
    }
}

impl From<Stop> for Halt {
    fn from(stop: Stop) -> Self {
        Self::Stop(stop)
    }
}

/// A configured navigator that has not been started yet.
#[derive(Debug)]
pub struct Navigator {
    state: Option<NavigatorState>,
    hub: EventHub,
    phase_tx: Option<watch::Sender<Phase>>,
    phase_rx: watch::Receiver<Phase>,
}

impl Navigator {
    pub fn new<P: Into<Page>>(
        surface: Arc<dyn Surface>,
        hub: EventHub,
        pages: impl IntoIterator<Item = P>,
        buttons: impl IntoIterator<Item = Button>,
        invocation: Invocation,
        config: NavigatorConfig,
    ) -> Result<Self, NavigatorError> {
        let pages: Arc<Vec<Page>> = Arc::new(pages.into_iter().map(Into::into).collect());
        if pages.is_empty() {
            return Err(NavigatorError::EmptyPages);
        }
        if let Some(index) = pages.iter().position(Page::is_empty) {
            return Err(NavigatorError::EmptyPage { index });
        }
        if config.timeout.is_zero() {
            return Err(NavigatorError::InvalidTimeout);
        }

        let mut registered = IndexMap::new();
        for button in buttons {
            let symbol = button.symbol().to_owned();
            if registered.contains_key(&symbol) {
                return Err(NavigatorError::DuplicateSymbol(symbol));
            }
            registered.insert(symbol, button);
        }

        let initial = isize::try_from(config.initial_page).unwrap_or(isize::MAX);
        let page_index = wrap_index(initial, pages.len());
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);

        Ok(Self {
            state: Some(NavigatorState {
                surface,
                pages,
                buttons: registered,
                config,
                owner: Some(invocation.author),
                invocation,
                page_index,
                surfaces: Vec::new(),
                dirty: false,
                root_deleted: false,
                events: None,
                pending: VecDeque::new(),
            }),
            hub,
            phase_tx: Some(phase_tx),
            phase_rx,
        })
    }

    /// Paginate `paginator` and navigate it with the default buttons.
    pub fn from_paginator(
        surface: Arc<dyn Surface>,
        hub: EventHub,
        paginator: &Paginator,
        invocation: Invocation,
        config: NavigatorConfig,
    ) -> Result<Self, NavigatorError> {
        let pages = paginator.pages()?.to_vec();
        Self::new(surface, hub, pages, default_buttons(), invocation, config)
    }

    /// Paginate `paginator`, turn every page into an embed with `generator`
    /// and navigate the result with `buttons`.
    ///
    /// Page numbers stay out of the message content when the generator
    /// already shows them.
    pub fn from_embeds(
        surface: Arc<dyn Surface>,
        hub: EventHub,
        paginator: &Paginator,
        generator: &dyn EmbedGenerator,
        buttons: impl IntoIterator<Item = Button>,
        invocation: Invocation,
        mut config: NavigatorConfig,
    ) -> Result<Self, NavigatorError> {
        let pages = embed_pages(paginator, generator)?;
        if generator.provides_numbering() {
            config.show_page_number = false;
        }
        Self::new(surface, hub, pages, buttons, invocation, config)
    }

    pub fn phase(&self) -> Phase {
        *self.phase_rx.borrow()
    }

    /// State before start. `None` once started.
    pub fn state(&self) -> Option<&NavigatorState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut NavigatorState> {
        self.state.as_mut()
    }

    /// Spawn the navigator loop.
    ///
    /// Subscribes to the hub before anything is rendered, so no press on the
    /// root can be missed.
    pub fn start(&mut self) -> Result<NavigatorHandle, NavigatorError> {
        let (Some(mut state), Some(phase_tx)) = (self.state.take(), self.phase_tx.take()) else {
            return Err(NavigatorError::AlreadyStarted);
        };

        state.events = Some(self.hub.subscribe());
        let (kill_tx, kill_rx) = watch::channel(None);
        let task = tokio::spawn(run_navigator(state, phase_tx, kill_rx));

        Ok(NavigatorHandle {
            kill: kill_tx,
            phase: self.phase_rx.clone(),
            task,
        })
    }
}

/// Control over a running navigator.
#[derive(Debug)]
pub struct NavigatorHandle {
    kill: watch::Sender<Option<CleanupAction>>,
    phase: watch::Receiver<Phase>,
    task: JoinHandle<Result<Termination, NavigatorError>>,
}

impl NavigatorHandle {
    /// Ask the navigator to stop with `cleanup`. Returns `false` if it already finished.
    pub fn kill(&self, cleanup: CleanupAction) -> bool {
        if self.is_finished() {
            return false;
        }
        self.kill.send(Some(cleanup)).is_ok()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::Finished
    }

    /// Wait until the first page is up, or the navigator finished before that.
    pub async fn ready(&mut self) -> Phase {
        match self
            .phase
            .wait_for(|phase| matches!(phase, Phase::Running | Phase::Finished))
            .await
        {
            Ok(phase) => *phase,
            Err(_) => Phase::Finished,
        }
    }

    /// Wait for the navigator to finish. Faults inside the loop surface here.
    pub async fn finished(self) -> Result<Termination, NavigatorError> {
        self.task
            .await
            .map_err(|source| NavigatorError::Fault(anyhow::Error::new(source)))?
    }
}

async fn run_navigator(
    mut state: NavigatorState,
    phase: watch::Sender<Phase>,
    mut kill: watch::Receiver<Option<CleanupAction>>,
) -> Result<Termination, NavigatorError> {
    phase.send_replace(Phase::Starting);

    let stop = {
        let drive = AssertUnwindSafe(state.drive(&phase)).catch_unwind();
        tokio::select! {
            cleanup = kill_requested(&mut kill) => Stop::new(TerminationReason::Killed, cleanup),
            outcome = drive => outcome.unwrap_or_else(|_| Stop::fault(anyhow!("navigator loop panicked"))),
        }
    };

    state.finish(stop, &phase).await
}

async fn kill_requested(kill: &mut watch::Receiver<Option<CleanupAction>>) -> CleanupAction {
    loop {
        if let Some(cleanup) = *kill.borrow_and_update() {
            return cleanup;
        }
        if kill.changed().await.is_err() {
            // Handle dropped without killing: run until another terminal condition.
            return std::future::pending().await;
        }
    }
}
