//! An in-process [`Surface`] that records every call.
//!
//! Used by tests and for driving navigators offline. Controls keep the list
//! of actors that pressed them, the way chat reactions do.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use twilight_model::channel::message::embed::Embed;

use super::events::SurfaceEvent;
use super::page::PageView;
use super::surface::{ActorId, RenderedControl, Surface, SurfaceError, SurfaceId};

/// A surface call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Render { surface: SurfaceId, content: String },
    Edit { surface: SurfaceId, content: String },
    Delete { surface: SurfaceId },
    ListControls { surface: SurfaceId },
    AddControl { surface: SurfaceId, symbol: String },
    RemoveControl {
        surface: SurfaceId,
        symbol: String,
        actor: Option<ActorId>,
    },
    ClearControls { surface: SurfaceId },
}

#[derive(Debug, Clone)]
struct Control {
    symbol: String,
    actors: Vec<ActorId>,
}

#[derive(Debug, Clone)]
struct Message {
    author: ActorId,
    content: String,
    embed: Option<Embed>,
    controls: Vec<Control>,
}

#[derive(Debug, Default)]
struct State {
    next_id: SurfaceId,
    messages: BTreeMap<SurfaceId, Message>,
    calls: Vec<SurfaceCall>,
    bots: BTreeSet<ActorId>,
    deny_controls: bool,
    deny_edits: bool,
}

#[derive(Debug)]
pub struct MemorySurface {
    scope: u64,
    me: ActorId,
    state: Mutex<State>,
}

impl MemorySurface {
    pub fn new(scope: u64, me: ActorId) -> Self {
        Self {
            scope,
            me,
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    /// Post a message as some other actor, e.g. the invoking command.
    pub fn post_foreign(&self, author: ActorId, content: &str) -> SurfaceId {
        let mut state = self.lock();
        insert_message(&mut state, author, content)
    }

    /// Record `actor` pressing `symbol` and return the matching event to publish.
    pub fn press(&self, surface: SurfaceId, symbol: &str, actor: ActorId) -> SurfaceEvent {
        let mut state = self.lock();
        if let Some(message) = state.messages.get_mut(&surface) {
            match message.controls.iter_mut().find(|control| control.symbol == symbol) {
                Some(control) if !control.actors.contains(&actor) => control.actors.push(actor),
                Some(_) => {}
                None => message.controls.push(Control {
                    symbol: symbol.to_owned(),
                    actors: vec![actor],
                }),
            }
        }

        SurfaceEvent::ControlPressed {
            surface,
            symbol: symbol.to_owned(),
            actor,
        }
    }

    /// Delete a surface out from under the navigator and return the event to publish.
    pub fn delete_externally(&self, surface: SurfaceId) -> SurfaceEvent {
        self.lock().messages.remove(&surface);
        SurfaceEvent::SurfaceDeleted { surface }
    }

    /// Make every control mutation fail with [`SurfaceError::Forbidden`].
    pub fn deny_controls(&self, deny: bool) {
        self.lock().deny_controls = deny;
    }

    /// Make every edit fail with [`SurfaceError::Forbidden`].
    pub fn deny_edits(&self, deny: bool) {
        self.lock().deny_edits = deny;
    }

    pub fn exists(&self, surface: SurfaceId) -> bool {
        self.lock().messages.contains_key(&surface)
    }

    pub fn content(&self, surface: SurfaceId) -> Option<String> {
        self.lock()
            .messages
            .get(&surface)
            .map(|message| message.content.clone())
    }

    pub fn embed(&self, surface: SurfaceId) -> Option<Embed> {
        self.lock()
            .messages
            .get(&surface)
            .and_then(|message| message.embed.clone())
    }

    /// Treat `actor` as an automated account from now on.
    pub fn mark_bot(&self, actor: ActorId) {
        self.lock().bots.insert(actor);
    }

    pub fn control_symbols(&self, surface: SurfaceId) -> Vec<String> {
        self.lock()
            .messages
            .get(&surface)
            .map(|message| message.controls.iter().map(|control| control.symbol.clone()).collect())
            .unwrap_or_default()
    }

    /// Actors recorded on one control, in press order.
    pub fn control_actors(&self, surface: SurfaceId, symbol: &str) -> Vec<ActorId> {
        self.lock()
            .messages
            .get(&surface)
            .and_then(|message| message.controls.iter().find(|control| control.symbol == symbol))
            .map(|control| control.actors.clone())
            .unwrap_or_default()
    }

    /// Ids of every live surface posted by the navigator's own actor, oldest first.
    pub fn own_surfaces(&self) -> Vec<SurfaceId> {
        self.lock()
            .messages
            .iter()
            .filter(|(_, message)| message.author == self.me)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn insert_message(state: &mut State, author: ActorId, content: &str) -> SurfaceId {
    state.next_id += 1;
    let id = state.next_id;
    state.messages.insert(
        id,
        Message {
            author,
            content: content.to_owned(),
            embed: None,
            controls: Vec::new(),
        },
    );
    id
}

fn message_mut(state: &mut State, surface: SurfaceId) -> Result<&mut Message, SurfaceError> {
    state.messages.get_mut(&surface).ok_or(SurfaceError::NotFound)
}

#[async_trait]
impl Surface for MemorySurface {
    fn scope(&self) -> u64 {
        self.scope
    }

    fn self_actor(&self) -> ActorId {
        self.me
    }

    async fn render(&self, content: &str) -> Result<SurfaceId, SurfaceError> {
        let mut state = self.lock();
        let surface = insert_message(&mut state, self.me, content);
        state.calls.push(SurfaceCall::Render {
            surface,
            content: content.to_owned(),
        });
        Ok(surface)
    }

    async fn edit(&self, surface: SurfaceId, view: &PageView) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::Edit {
            surface,
            content: view.content.clone(),
        });
        if state.deny_edits {
            return Err(SurfaceError::Forbidden);
        }

        let message = message_mut(&mut state, surface)?;
        message.content = view.content.clone();
        message.embed = view.embed.clone();
        Ok(())
    }

    async fn delete(&self, surface: SurfaceId) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::Delete { surface });
        state
            .messages
            .remove(&surface)
            .map(|_| ())
            .ok_or(SurfaceError::NotFound)
    }

    async fn list_controls(
        &self,
        surface: SurfaceId,
    ) -> Result<Vec<RenderedControl>, SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::ListControls { surface });
        let me = self.me;
        let message = message_mut(&mut state, surface)?;

        Ok(message
            .controls
            .iter()
            .map(|control| RenderedControl {
                symbol: control.symbol.clone(),
                mine: control.actors.contains(&me),
                foreign: control.actors.iter().copied().filter(|actor| *actor != me).collect(),
            })
            .collect())
    }

    async fn add_control(&self, surface: SurfaceId, symbol: &str) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::AddControl {
            surface,
            symbol: symbol.to_owned(),
        });
        if state.deny_controls {
            return Err(SurfaceError::Forbidden);
        }

        let me = self.me;
        let message = message_mut(&mut state, surface)?;
        match message.controls.iter_mut().find(|control| control.symbol == symbol) {
            Some(control) if !control.actors.contains(&me) => control.actors.insert(0, me),
            Some(_) => {}
            None => message.controls.push(Control {
                symbol: symbol.to_owned(),
                actors: vec![me],
            }),
        }
        Ok(())
    }

    async fn remove_control(
        &self,
        surface: SurfaceId,
        symbol: &str,
        actor: Option<ActorId>,
    ) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::RemoveControl {
            surface,
            symbol: symbol.to_owned(),
            actor,
        });
        if state.deny_controls {
            return Err(SurfaceError::Forbidden);
        }

        let message = message_mut(&mut state, surface)?;
        match actor {
            None => message.controls.retain(|control| control.symbol != symbol),
            Some(actor) => {
                if let Some(control) = message.controls.iter_mut().find(|control| control.symbol == symbol) {
                    control.actors.retain(|recorded| *recorded != actor);
                }
                message.controls.retain(|control| !control.actors.is_empty());
            }
        }
        Ok(())
    }

    async fn is_bot(&self, actor: ActorId) -> Result<bool, SurfaceError> {
        Ok(actor == self.me || self.lock().bots.contains(&actor))
    }

    async fn clear_controls(&self, surface: SurfaceId) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.calls.push(SurfaceCall::ClearControls { surface });
        if state.deny_controls {
            return Err(SurfaceError::Forbidden);
        }
        message_mut(&mut state, surface)?.controls.clear();
        Ok(())
    }
}
