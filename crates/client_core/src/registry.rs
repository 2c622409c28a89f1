//! The rendered behaviour list. Rebuilt wholesale on every resolution.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{CommandAction, ProjectResolution};
use tokio::sync::broadcast;

use crate::{
    controls::{ActionOutcome, Control, ControlSnapshot},
    dispatcher::{idle_label, CommandDispatcher},
    ConsoleEvent,
};

pub const ADMIN_PLACEHOLDER: &str = "Ni najdenih behaviourjev";
pub const REMOTE_PLACEHOLDER: &str = "Ni naloženih obnašanj (admin še ni skeniral projekta)";
pub const OPERATOR_PLACEHOLDER: &str = "Ni razpoložljivih behaviourjev";

/// One rendered behaviour. Its name is fixed when the card is built, so
/// every action it triggers targets that behaviour and no other.
pub struct BehaviourCard {
    name: String,
    start: Arc<Control>,
    stop: Arc<Control>,
    dispatcher: Arc<CommandDispatcher>,
}

impl BehaviourCard {
    fn new(name: String, dispatcher: Arc<CommandDispatcher>) -> Arc<Self> {
        Arc::new(Self {
            name,
            start: Control::new(idle_label(CommandAction::Start)),
            stop: Control::new(idle_label(CommandAction::Stop)),
            dispatcher,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self, action: CommandAction) -> &Arc<Control> {
        match action {
            CommandAction::Start => &self.start,
            CommandAction::Stop => &self.stop,
        }
    }

    pub async fn trigger(&self, action: CommandAction) -> ActionOutcome {
        self.dispatcher
            .dispatch(&self.name, action, self.control(action))
            .await
    }

    pub async fn start(&self) -> ActionOutcome {
        self.trigger(CommandAction::Start).await
    }

    pub async fn stop(&self) -> ActionOutcome {
        self.trigger(CommandAction::Stop).await
    }

    pub fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            name: self.name.clone(),
            start: self.start.snapshot(),
            stop: self.stop.snapshot(),
        }
    }
}

/// What a card shows: its name and the state of its two controls. The
/// dispatcher's running book is never drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    pub name: String,
    pub start: ControlSnapshot,
    pub stop: ControlSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySnapshot {
    /// No cards: the placeholder, or a scan failure shown inline.
    Placeholder(String),
    Cards(Vec<CardSnapshot>),
}

enum Rendered {
    Placeholder(String),
    Cards(Vec<Arc<BehaviourCard>>),
}

pub struct BehaviourRegistry {
    dispatcher: Arc<CommandDispatcher>,
    placeholder: String,
    rendered: Mutex<Rendered>,
    events: broadcast::Sender<ConsoleEvent>,
}

impl BehaviourRegistry {
    pub fn new(
        dispatcher: Arc<CommandDispatcher>,
        placeholder: impl Into<String>,
        events: broadcast::Sender<ConsoleEvent>,
    ) -> Self {
        let placeholder = placeholder.into();
        Self {
            dispatcher,
            rendered: Mutex::new(Rendered::Placeholder(placeholder.clone())),
            placeholder,
            events,
        }
    }

    fn rendered(&self) -> MutexGuard<'_, Rendered> {
        self.rendered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces whatever is shown with one card per name, in order. An empty
    /// list shows the placeholder instead.
    pub fn render(&self, behaviours: &[String]) {
        let next = if behaviours.is_empty() {
            Rendered::Placeholder(self.placeholder.clone())
        } else {
            Rendered::Cards(
                behaviours
                    .iter()
                    .map(|name| BehaviourCard::new(name.clone(), Arc::clone(&self.dispatcher)))
                    .collect(),
            )
        };
        *self.rendered() = next;
        self.publish();
    }

    pub fn render_resolution(&self, resolution: &ProjectResolution) {
        self.render(&resolution.behaviours);
    }

    /// Shows `message` where the list would be.
    pub fn render_message(&self, message: impl Into<String>) {
        *self.rendered() = Rendered::Placeholder(message.into());
        self.publish();
    }

    fn publish(&self) {
        let _ = self
            .events
            .send(ConsoleEvent::RegistryRebuilt(self.snapshot()));
    }

    pub fn cards(&self) -> Vec<Arc<BehaviourCard>> {
        match &*self.rendered() {
            Rendered::Placeholder(_) => Vec::new(),
            Rendered::Cards(cards) => cards.clone(),
        }
    }

    pub fn card(&self, name: &str) -> Option<Arc<BehaviourCard>> {
        match &*self.rendered() {
            Rendered::Placeholder(_) => None,
            Rendered::Cards(cards) => cards.iter().find(|card| card.name == name).cloned(),
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        match &*self.rendered() {
            Rendered::Placeholder(text) => RegistrySnapshot::Placeholder(text.clone()),
            Rendered::Cards(cards) => {
                RegistrySnapshot::Cards(cards.iter().map(|card| card.snapshot()).collect())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
