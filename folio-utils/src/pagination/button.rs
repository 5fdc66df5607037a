//! Navigator controls: a symbol bound to a callback and gated by predicates.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use super::navigator::NavigatorState;
use super::surface::{ActorId, SurfaceId};
use crate::cleanup::CleanupAction;

/// What a button callback asks the navigator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Keep running.
    Continue,
    /// Stop, applying the given cleanup.
    Cancel(CleanupAction),
}

/// A control press that passed the navigator's whitelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Press {
    pub surface: SurfaceId,
    pub symbol: String,
    pub actor: ActorId,
}

pub type Callback = Arc<
    dyn for<'a> Fn(&'a Button, &'a mut NavigatorState, &'a Press) -> BoxFuture<'a, anyhow::Result<Signal>>
        + Send
        + Sync,
>;

pub type DisplayPredicate =
    Arc<dyn for<'a> Fn(&'a Button, &'a NavigatorState) -> BoxFuture<'a, bool> + Send + Sync>;

pub type InvokePredicate = Arc<
    dyn for<'a> Fn(&'a Button, &'a NavigatorState, &'a Press) -> BoxFuture<'a, bool> + Send + Sync,
>;

/// A pressable control.
///
/// Display predicates decide whether the control is shown; invoke predicates
/// decide whether a press runs the callback. Both short-circuit on the first
/// `false`. Cloning is cheap.
#[derive(Clone)]
pub struct Button {
    symbol: String,
    name: String,
    description: String,
    callback: Callback,
    display_predicates: Vec<DisplayPredicate>,
    invoke_predicates: Vec<InvokePredicate>,
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("symbol", &self.symbol)
            .field("name", &self.name)
            .field("display_predicates", &self.display_predicates.len())
            .field("invoke_predicates", &self.invoke_predicates.len())
            .finish()
    }
}

impl Button {
    /// Create a button with an async callback.
    pub fn new<F>(symbol: impl Into<String>, name: impl Into<String>, callback: F) -> Self
    where
        F: for<'a> Fn(&'a Button, &'a mut NavigatorState, &'a Press) -> BoxFuture<'a, anyhow::Result<Signal>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            description: String::new(),
            callback: Arc::new(callback),
            display_predicates: Vec::new(),
            invoke_predicates: Vec::new(),
        }
    }

    /// Create a button with a synchronous callback.
    pub fn from_fn<F>(symbol: impl Into<String>, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Button, &mut NavigatorState, &Press) -> anyhow::Result<Signal> + Send + Sync + 'static,
    {
        Self::new(symbol, name, move |button, state, press| {
            Box::pin(future::ready(callback(button, state, press)))
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Show the button only while `predicate` holds.
    pub fn display_if<F>(self, predicate: F) -> Self
    where
        F: Fn(&Button, &NavigatorState) -> bool + Send + Sync + 'static,
    {
        self.display_if_async(move |button, state| Box::pin(future::ready(predicate(button, state))))
    }

    pub fn display_if_async<F>(mut self, predicate: F) -> Self
    where
        F: for<'a> Fn(&'a Button, &'a NavigatorState) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        self.display_predicates.push(Arc::new(predicate));
        self
    }

    /// Run the callback only for presses satisfying `predicate`.
    pub fn invoke_if<F>(self, predicate: F) -> Self
    where
        F: Fn(&Button, &NavigatorState, &Press) -> bool + Send + Sync + 'static,
    {
        self.invoke_if_async(move |button, state, press| {
            Box::pin(future::ready(predicate(button, state, press)))
        })
    }

    pub fn invoke_if_async<F>(mut self, predicate: F) -> Self
    where
        F: for<'a> Fn(&'a Button, &'a NavigatorState, &'a Press) -> BoxFuture<'a, bool>
            + Send
            + Sync
            + 'static,
    {
        self.invoke_predicates.push(Arc::new(predicate));
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn set_symbol(&mut self, symbol: String) {
        self.symbol = symbol;
    }

    /// Whether every display predicate holds.
    pub async fn should_show(&self, state: &NavigatorState) -> bool {
        for predicate in &self.display_predicates {
            if !predicate(self, state).await {
                return false;
            }
        }
        true
    }

    /// Check the invoke predicates, then run the callback.
    ///
    /// A press rejected by a predicate is a no-op that keeps the navigator running.
    pub async fn invoke(&self, state: &mut NavigatorState, press: &Press) -> anyhow::Result<Signal> {
        for predicate in &self.invoke_predicates {
            if !predicate(self, &*state, press).await {
                return Ok(Signal::Continue);
            }
        }

        (self.callback)(self, state, press).await
    }
}
