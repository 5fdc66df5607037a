use std::sync::Arc;
use std::time::Duration;

use folio_utils::pagination::{
    EventHub, Invocation, MemorySurface, PickError, PickerConfig, SurfaceEvent, option_picker,
};
use tokio::task::JoinHandle;
use tokio::time::sleep;

const SCOPE: u64 = 1;
const ME: u64 = 99;
const AUTHOR: u64 = 7;
const STRANGER: u64 = 8;

fn config() -> PickerConfig {
    PickerConfig {
        prompt: "Which colour?".to_owned(),
        timeout: Duration::from_secs(30),
        max_lines: 6,
    }
}

fn colours() -> Vec<String> {
    ["red", "green", "blue"].map(String::from).to_vec()
}

struct Harness {
    surface: Arc<MemorySurface>,
    hub: EventHub,
}

impl Harness {
    fn new() -> Self {
        Self {
            surface: Arc::new(MemorySurface::new(SCOPE, ME)),
            hub: EventHub::new(),
        }
    }

    fn pick(
        &self,
        options: Vec<String>,
        invocation: Invocation,
        config: PickerConfig,
    ) -> JoinHandle<Result<Option<String>, PickError>> {
        let surface = self.surface.clone();
        let hub = self.hub.clone();
        tokio::spawn(async move {
            option_picker(surface, &hub, options, |option| option.clone(), invocation, config).await
        })
    }

    async fn reply(&self, actor: u64, content: &str) -> u64 {
        let surface = self.surface.post_foreign(actor, content);
        self.hub.publish(SurfaceEvent::Reply {
            scope: SCOPE,
            surface,
            actor,
            content: content.to_owned(),
        });
        settle().await;
        surface
    }
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn the_author_picks_by_number() {
    let harness = Harness::new();
    let invocation_message = harness.surface.post_foreign(AUTHOR, "!choose red | green | blue");
    let invocation = Invocation {
        message: Some(invocation_message),
        ..Invocation::new(AUTHOR)
    };

    let picking = harness.pick(colours(), invocation, config());
    settle().await;

    let root = harness.surface.own_surfaces()[0];
    let embed = harness.surface.embed(root).unwrap();
    assert_eq!(embed.title.as_deref(), Some("Which colour?"));
    assert_eq!(
        embed.description.as_deref(),
        Some("`cancel` - cancel this\n`1` - red\n`2` - green\n`3` - blue")
    );

    let answer = harness.reply(AUTHOR, "2").await;
    assert_eq!(picking.await.unwrap().unwrap().as_deref(), Some("green"));

    assert!(harness.surface.own_surfaces().is_empty());
    assert!(!harness.surface.exists(answer));
    assert!(!harness.surface.exists(invocation_message));
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_returns_nothing() {
    let harness = Harness::new();
    let picking = harness.pick(colours(), Invocation::new(AUTHOR), config());
    settle().await;

    harness.reply(AUTHOR, "cancel").await;
    assert_eq!(picking.await.unwrap().unwrap(), None);
    assert!(harness.surface.own_surfaces().is_empty());
}

#[tokio::test(start_paused = true)]
async fn strangers_and_bad_answers_are_ignored_until_timeout() {
    let harness = Harness::new();
    let picking = harness.pick(colours(), Invocation::new(AUTHOR), config());
    settle().await;

    let stranger = harness.reply(STRANGER, "1").await;
    let out_of_range = harness.reply(AUTHOR, "4").await;
    harness.reply(AUTHOR, "blue").await;
    assert!(!picking.is_finished());
    assert!(harness.surface.exists(stranger));
    assert!(harness.surface.exists(out_of_range));

    let result = picking.await.unwrap();
    assert!(matches!(result, Err(PickError::TimedOut)), "{result:?}");
    assert!(harness.surface.own_surfaces().is_empty());
}

#[tokio::test(start_paused = true)]
async fn long_option_lists_are_paged() {
    let harness = Harness::new();
    let options: Vec<String> = (1..=10).map(|n| format!("option {n}")).collect();
    let picking = harness.pick(
        options,
        Invocation::new(AUTHOR),
        PickerConfig {
            max_lines: 4,
            ..config()
        },
    );
    settle().await;

    let root = harness.surface.own_surfaces()[0];
    assert_eq!(harness.surface.control_symbols(root).len(), 2);

    harness.reply(AUTHOR, "10").await;
    assert_eq!(picking.await.unwrap().unwrap().as_deref(), Some("option 10"));
}

#[tokio::test(start_paused = true)]
async fn a_single_option_is_picked_without_asking() {
    let harness = Harness::new();
    let picked = harness
        .pick(vec!["only".to_owned()], Invocation::new(AUTHOR), config())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(picked.as_deref(), Some("only"));
    assert!(harness.surface.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_requests_are_rejected() {
    let harness = Harness::new();

    let empty = harness.pick(Vec::new(), Invocation::new(AUTHOR), config()).await.unwrap();
    assert!(matches!(empty, Err(PickError::NoOptions)));

    let instant = harness
        .pick(
            colours(),
            Invocation::new(AUTHOR),
            PickerConfig {
                timeout: Duration::ZERO,
                ..config()
            },
        )
        .await
        .unwrap();
    assert!(matches!(instant, Err(PickError::InvalidTimeout)));
    assert_eq!(harness.hub.subscriber_count(), 0);
}
