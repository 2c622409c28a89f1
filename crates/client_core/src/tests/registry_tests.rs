use std::sync::Arc;

use tokio::sync::broadcast;

use super::*;
use crate::{
    dispatcher::{BUSY_LABEL, START_LABEL, STOP_LABEL},
    oplog::{OperationLog, LOG_CAPACITY},
    test_support::ScriptedApi,
};

fn registry(api: &Arc<ScriptedApi>) -> (BehaviourRegistry, broadcast::Receiver<ConsoleEvent>) {
    let (events, rx) = broadcast::channel(64);
    let log = Arc::new(OperationLog::new(LOG_CAPACITY, events.clone()));
    let dispatcher = Arc::new(CommandDispatcher::new(api.clone(), log));
    (BehaviourRegistry::new(dispatcher, ADMIN_PLACEHOLDER, events), rx)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[test]
fn renders_one_card_per_behaviour_in_order() {
    let api = ScriptedApi::new();
    let (registry, _rx) = registry(&api);

    registry.render(&names(&["wave", "greet", "sit"]));

    let RegistrySnapshot::Cards(cards) = registry.snapshot() else {
        panic!("expected cards");
    };
    let rendered: Vec<&str> = cards.iter().map(|card| card.name.as_str()).collect();
    assert_eq!(rendered, vec!["wave", "greet", "sit"]);
    assert!(cards.iter().all(|card| card.start.label == START_LABEL
        && card.stop.label == STOP_LABEL
        && !card.start.disabled
        && !card.stop.disabled));
}

#[test]
fn empty_list_renders_only_the_placeholder() {
    let api = ScriptedApi::new();
    let (registry, _rx) = registry(&api);
    assert_eq!(
        registry.snapshot(),
        RegistrySnapshot::Placeholder(ADMIN_PLACEHOLDER.to_string())
    );

    registry.render(&names(&["wave"]));
    registry.render(&[]);

    assert_eq!(
        registry.snapshot(),
        RegistrySnapshot::Placeholder(ADMIN_PLACEHOLDER.to_string())
    );
    assert!(registry.cards().is_empty());
}

#[test]
fn rebuild_replaces_cards_instead_of_diffing() {
    let api = ScriptedApi::new();
    let (registry, mut rx) = registry(&api);

    registry.render(&names(&["wave"]));
    let before = registry.card("wave").expect("card");
    registry.render(&names(&["wave"]));
    let after = registry.card("wave").expect("card");

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(matches!(rx.try_recv(), Ok(ConsoleEvent::RegistryRebuilt(_))));
    assert!(matches!(rx.try_recv(), Ok(ConsoleEvent::RegistryRebuilt(_))));
}

#[test]
fn inline_message_takes_the_place_of_the_list() {
    let api = ScriptedApi::new();
    let (registry, _rx) = registry(&api);
    registry.render(&names(&["wave"]));

    registry.render_message("Pot ni dovoljena");

    assert_eq!(
        registry.snapshot(),
        RegistrySnapshot::Placeholder("Pot ni dovoljena".to_string())
    );
    assert!(registry.card("wave").is_none());
}

#[tokio::test]
async fn each_card_targets_its_own_behaviour() {
    let api = ScriptedApi::new();
    let (registry, _rx) = registry(&api);
    let list: Vec<String> = (0..5).map(|i| format!("b{i}")).collect();
    registry.render(&list);

    let cards = registry.cards();
    assert_eq!(cards[4].start().await, ActionOutcome::Succeeded);
    assert_eq!(cards[1].stop().await, ActionOutcome::Succeeded);

    assert_eq!(
        api.calls(),
        vec![
            "POST /behaviours/b4/start".to_string(),
            "POST /behaviours/b1/stop".to_string(),
        ]
    );
}

#[tokio::test]
async fn card_snapshot_tracks_busy_control_only() {
    let api = ScriptedApi::new();
    let gate = api.hold("wave", CommandAction::Start);
    let (registry, _rx) = registry(&api);
    registry.render(&names(&["wave", "greet"]));
    let card = registry.card("wave").expect("card");

    let pending = tokio::spawn({
        let card = Arc::clone(&card);
        async move { card.start().await }
    });
    while api.count("POST /behaviours/wave/start") == 0 {
        tokio::task::yield_now().await;
    }

    let snapshot = card.snapshot();
    assert_eq!(snapshot.start.label, BUSY_LABEL);
    assert!(snapshot.start.disabled);
    assert!(!snapshot.stop.disabled);
    let greet = registry.card("greet").expect("card").snapshot();
    assert!(!greet.start.disabled);

    gate.notify_one();
    pending.await.expect("join");
    // Started, yet the card looks exactly as it did before the click.
    assert_eq!(
        card.snapshot(),
        CardSnapshot {
            name: "wave".to_string(),
            start: ControlSnapshot {
                label: START_LABEL.to_string(),
                disabled: false,
            },
            stop: ControlSnapshot {
                label: STOP_LABEL.to_string(),
                disabled: false,
            },
        }
    );
}
