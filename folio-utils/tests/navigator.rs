use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use folio_utils::pagination::buttons::{
    CLOSE, INPUT_NUMBER, NEXT_PAGE, PREVIOUS_PAGE, RESTRICT_CONTROL, SHARE_CONTROL,
};
use folio_utils::pagination::memory::SurfaceCall;
use folio_utils::pagination::{
    Button, CleanupAction, DefaultEmbedGenerator, EventHub, Invocation, MemorySurface, Navigator,
    NavigatorConfig, NavigatorError, NavigatorHandle, Page, Paginator, PaginatorConfig, Phase,
    SurfaceEvent, TerminationReason, default_buttons,
};
use tokio::time::{Instant, sleep, sleep_until};

const SCOPE: u64 = 1;
const ME: u64 = 99;
const AUTHOR: u64 = 7;
const STRANGER: u64 = 8;

fn pages(count: usize) -> Vec<String> {
    (1..=count).map(|number| format!("page {number}")).collect()
}

fn config() -> NavigatorConfig {
    NavigatorConfig {
        timeout: Duration::from_secs(5),
        show_page_number: false,
        ..NavigatorConfig::default()
    }
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

    fn navigator(
        &self,
        pages: Vec<String>,
        buttons: Vec<Button>,
        invocation: Invocation,
        config: NavigatorConfig,
    ) -> Navigator {
        Navigator::new(
            self.surface.clone(),
            self.hub.clone(),
            pages,
            buttons,
            invocation,
            config,
        )
        .unwrap()
    }

    async fn start(&self, navigator: &mut Navigator) -> (NavigatorHandle, u64) {
        let mut handle = navigator.start().unwrap();
        assert_eq!(handle.ready().await, Phase::Running);
        settle().await;
        let root = self.surface.own_surfaces()[0];
        (handle, root)
    }

    async fn press(&self, root: u64, symbol: &str, actor: u64) {
        self.hub.publish(self.surface.press(root, symbol, actor));
        settle().await;
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

/// Let the navigator task run until it is waiting on its next event.
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn idle_navigator_times_out_and_keeps_last_page() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let started = Instant::now();
    let (handle, root) = harness.start(&mut navigator).await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE]
    );

    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::TimedOut);
    assert_eq!(termination.cleanup, CleanupAction::ON_TIMEOUT);
    assert!(started.elapsed() >= Duration::from_secs(5));

    assert_eq!(harness.surface.own_surfaces(), [root]);
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));
    assert!(harness.surface.control_symbols(root).is_empty());
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn single_page_never_shows_next() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(1), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    assert_eq!(harness.surface.control_symbols(root), [CLOSE]);

    assert!(handle.kill(CleanupAction::REMOVE_ROOT));
    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::Killed);
    assert!(!harness.surface.exists(root));
}

#[tokio::test(start_paused = true)]
async fn next_on_last_page_wraps_to_first() {
    let harness = Harness::new();
    let config = NavigatorConfig {
        initial_page: 2,
        ..config()
    };
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config);

    let (handle, root) = harness.start(&mut navigator).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 3"));

    harness.press(root, NEXT_PAGE, AUTHOR).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));

    harness.press(root, PREVIOUS_PAGE, AUTHOR).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 3"));

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn page_number_header_is_rendered() {
    let harness = Harness::new();
    let config = NavigatorConfig {
        show_page_number: true,
        ..config()
    };
    let mut navigator = harness.navigator(pages(2), default_buttons(), Invocation::new(AUTHOR), config);

    let (handle, root) = harness.start(&mut navigator).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("[1/2]\npage 1"));

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn close_removes_everything_including_invocation() {
    let harness = Harness::new();
    let invocation_message = harness.surface.post_foreign(AUTHOR, "!help");
    let invocation = Invocation {
        author: AUTHOR,
        message: Some(invocation_message),
        shared: true,
    };
    let mut navigator = harness.navigator(pages(3), default_buttons(), invocation, config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, CLOSE, AUTHOR).await;

    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::Cancelled);
    assert_eq!(termination.cleanup, CleanupAction::REMOVE_ALL_MESSAGES);
    assert!(!harness.surface.exists(root));
    assert!(!harness.surface.exists(invocation_message));
}

#[tokio::test(start_paused = true)]
async fn presses_from_strangers_are_ignored_and_stripped() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, NEXT_PAGE, STRANGER).await;

    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));
    assert_eq!(harness.surface.control_actors(root, NEXT_PAGE), [ME]);
    assert_eq!(handle.phase(), Phase::Running);

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unlocked_navigator_still_guards_close() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());
    navigator.state_mut().unwrap().unlock();

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, CLOSE, STRANGER).await;
    assert!(harness.surface.exists(root));
    assert!(!handle.is_finished());

    harness.press(root, NEXT_PAGE, STRANGER).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 2"));

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn deleting_the_root_finishes_the_navigator() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.hub.publish(harness.surface.delete_externally(root));

    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::RootDeleted);
    assert_eq!(termination.cleanup, CleanupAction::REMOVE_NON_ROOT);
}

#[tokio::test(start_paused = true)]
async fn missing_permissions_are_reported_once_and_clean_up() {
    let harness = Harness::new();
    harness.surface.deny_controls(true);
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let handle = navigator.start().unwrap();
    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::PermissionDenied);
    assert_eq!(termination.cleanup, CleanupAction::REMOVE_ALL_SENT);

    let remaining = harness.surface.own_surfaces();
    assert_eq!(remaining.len(), 1);
    let notice = harness.surface.content(remaining[0]).unwrap_or_default();
    assert!(notice.contains("permissions"), "{notice}");
}

#[tokio::test(start_paused = true)]
async fn callback_errors_surface_as_faults() {
    let harness = Harness::new();
    let explode = Button::from_fn("💥", "explode", |_, _, _| Err(anyhow!("boom")));
    let mut navigator = harness.navigator(pages(2), vec![explode], Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, "💥", AUTHOR).await;

    let result = handle.finished().await;
    assert!(matches!(result, Err(NavigatorError::Fault(_))), "{result:?}");
    assert!(!harness.surface.exists(root));
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn callback_panics_still_clean_up() {
    let harness = Harness::new();
    let bomb = Button::from_fn("💣", "bomb", |_, _, _| panic!("kaboom"));
    let mut navigator = harness.navigator(pages(2), vec![bomb], Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, "💣", AUTHOR).await;

    assert!(matches!(handle.finished().await, Err(NavigatorError::Fault(_))));
    assert!(!harness.surface.exists(root));
}

#[tokio::test(start_paused = true)]
async fn starting_twice_is_rejected() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(2), default_buttons(), Invocation::new(AUTHOR), config());

    let handle = navigator.start().unwrap();
    assert!(matches!(navigator.start(), Err(NavigatorError::AlreadyStarted)));

    handle.kill(CleanupAction::REMOVE_ALL_SENT);
    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::Killed);
}

#[tokio::test(start_paused = true)]
async fn kill_after_finish_is_a_no_op() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(2), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    sleep(Duration::from_secs(6)).await;

    assert!(handle.is_finished());
    assert!(!handle.kill(CleanupAction::REMOVE_ROOT));
    assert!(harness.surface.exists(root));
    assert_eq!(handle.finished().await.unwrap().reason, TerminationReason::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn input_number_jumps_and_buffers_presses() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(5), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, INPUT_NUMBER, AUTHOR).await;

    let own = harness.surface.own_surfaces();
    assert_eq!(own.len(), 2);
    let prompt = own[1];
    assert!(harness.surface.content(prompt).unwrap_or_default().contains("between 1 and 5"));

    // Arrives while the callback waits for the reply, so it runs afterwards.
    harness.press(root, NEXT_PAGE, AUTHOR).await;
    let reply = harness.reply(AUTHOR, "2").await;

    assert_eq!(harness.surface.content(root).as_deref(), Some("page 3"));
    assert!(!harness.surface.exists(prompt));
    assert!(!harness.surface.exists(reply));

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn input_number_ignores_out_of_range_replies() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(5), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, INPUT_NUMBER, AUTHOR).await;
    harness.reply(AUTHOR, "9").await;

    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));
    assert_eq!(handle.phase(), Phase::Running);

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn control_can_be_shared_and_taken_back() {
    let harness = Harness::new();
    let invocation = Invocation {
        author: AUTHOR,
        message: None,
        shared: true,
    };
    let mut navigator = harness.navigator(pages(2), default_buttons(), invocation, config());

    let (handle, root) = harness.start(&mut navigator).await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE, SHARE_CONTROL]
    );

    harness.press(root, SHARE_CONTROL, AUTHOR).await;
    harness.reply(AUTHOR, "<@42>").await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE, RESTRICT_CONTROL]
    );

    harness.press(root, NEXT_PAGE, 42).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 2"));

    harness.press(root, RESTRICT_CONTROL, AUTHOR).await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE, SHARE_CONTROL]
    );

    harness.press(root, NEXT_PAGE, 42).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 2"));

    let restored = harness
        .surface
        .own_surfaces()
        .into_iter()
        .find(|surface| {
            harness.surface.content(*surface).as_deref() == Some("Okay, only you can control this again.")
        })
        .unwrap();

    handle.kill(CleanupAction::REMOVE_ALL_SENT);
    handle.finished().await.unwrap();
    assert_eq!(harness.surface.own_surfaces(), [restored]);

    sleep(Duration::from_secs(11)).await;
    assert!(harness.surface.own_surfaces().is_empty());
}

#[tokio::test(start_paused = true)]
async fn control_is_never_handed_to_bots() {
    let harness = Harness::new();
    harness.surface.mark_bot(42);
    let invocation = Invocation {
        author: AUTHOR,
        message: None,
        shared: true,
    };
    let mut navigator = harness.navigator(pages(2), default_buttons(), invocation, config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, SHARE_CONTROL, AUTHOR).await;
    harness.reply(AUTHOR, "<@42>").await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE, SHARE_CONTROL]
    );

    harness.press(root, NEXT_PAGE, 42).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));

    harness.press(root, SHARE_CONTROL, AUTHOR).await;
    harness.reply(AUTHOR, &format!("<@{ME}>")).await;
    assert_eq!(
        harness.surface.control_symbols(root),
        [PREVIOUS_PAGE, CLOSE, NEXT_PAGE, SHARE_CONTROL]
    );

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stranger_presses_do_not_extend_the_idle_timeout() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let started = Instant::now();
    let (handle, root) = harness.start(&mut navigator).await;

    sleep_until(started + Duration::from_secs(3)).await;
    harness.press(root, NEXT_PAGE, STRANGER).await;
    assert!(!handle.is_finished());

    sleep_until(started + Duration::from_millis(5_100)).await;
    assert!(handle.is_finished());
    assert_eq!(handle.finished().await.unwrap().reason, TerminationReason::TimedOut);
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 1"));
}

#[tokio::test(start_paused = true)]
async fn unknown_symbols_do_not_extend_the_idle_timeout() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(3), default_buttons(), Invocation::new(AUTHOR), config());

    let started = Instant::now();
    let (handle, root) = harness.start(&mut navigator).await;

    sleep_until(started + Duration::from_secs(3)).await;
    harness.press(root, "😀", AUTHOR).await;
    assert!(!harness.surface.control_symbols(root).iter().any(|symbol| symbol == "😀"));

    sleep_until(started + Duration::from_millis(5_100)).await;
    assert!(handle.is_finished());
    assert_eq!(handle.finished().await.unwrap().reason, TerminationReason::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn externally_deleted_prompts_are_no_longer_tracked() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(5), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, INPUT_NUMBER, AUTHOR).await;
    let prompt = harness.surface.own_surfaces()[1];

    harness.hub.publish(harness.surface.delete_externally(prompt));
    settle().await;
    assert_eq!(handle.phase(), Phase::Running);

    handle.kill(CleanupAction::REMOVE_ALL_SENT);
    assert_eq!(handle.finished().await.unwrap().reason, TerminationReason::Killed);
    assert!(!harness.surface.exists(root));
    assert!(
        !harness
            .surface
            .calls()
            .contains(&SurfaceCall::Delete { surface: prompt })
    );
}

#[tokio::test(start_paused = true)]
async fn root_deleted_while_awaiting_a_reply_ends_the_navigator() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(5), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, INPUT_NUMBER, AUTHOR).await;
    let prompt = harness.surface.own_surfaces()[1];

    harness.hub.publish(harness.surface.delete_externally(root));

    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::RootDeleted);
    assert_eq!(termination.cleanup, CleanupAction::REMOVE_NON_ROOT);
    assert!(!harness.surface.exists(prompt));
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn kill_while_running_applies_the_requested_cleanup() {
    let harness = Harness::new();
    let invocation_message = harness.surface.post_foreign(AUTHOR, "!show");
    let invocation = Invocation {
        message: Some(invocation_message),
        ..Invocation::new(AUTHOR)
    };
    let mut navigator = harness.navigator(pages(3), default_buttons(), invocation, config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, NEXT_PAGE, AUTHOR).await;
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 2"));

    assert!(handle.kill(CleanupAction::REMOVE_CONTROLS));
    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::Killed);
    assert_eq!(termination.cleanup, CleanupAction::REMOVE_CONTROLS);
    assert_eq!(harness.surface.content(root).as_deref(), Some("page 2"));
    assert!(harness.surface.control_symbols(root).is_empty());
    assert!(harness.surface.exists(invocation_message));
}

#[tokio::test(start_paused = true)]
async fn kill_inside_a_callback_removes_its_prompt() {
    let harness = Harness::new();
    let mut navigator = harness.navigator(pages(5), default_buttons(), Invocation::new(AUTHOR), config());

    let (handle, root) = harness.start(&mut navigator).await;
    harness.press(root, INPUT_NUMBER, AUTHOR).await;
    let prompt = harness.surface.own_surfaces()[1];

    assert!(handle.kill(CleanupAction::REMOVE_ALL_SENT));
    let termination = handle.finished().await.unwrap();
    assert_eq!(termination.reason, TerminationReason::Killed);
    assert!(!harness.surface.exists(root));
    assert!(!harness.surface.exists(prompt));
    assert_eq!(harness.hub.subscriber_count(), 0);

    // A reply that arrives after the kill changes nothing.
    harness.reply(AUTHOR, "3").await;
    assert!(harness.surface.own_surfaces().is_empty());
}

#[tokio::test(start_paused = true)]
async fn embed_pages_carry_their_own_numbering() {
    let harness = Harness::new();
    let mut paginator = Paginator::new(PaginatorConfig {
        max_lines: Some(1),
        ..PaginatorConfig::default()
    })
    .unwrap();
    paginator.add_lines(["alpha", "beta"]);

    let mut navigator = Navigator::from_embeds(
        harness.surface.clone(),
        harness.hub.clone(),
        &paginator,
        &DefaultEmbedGenerator,
        default_buttons(),
        Invocation::new(AUTHOR),
        NavigatorConfig {
            show_page_number: true,
            ..config()
        },
    )
    .unwrap();

    let (handle, root) = harness.start(&mut navigator).await;
    let footer = |surface| {
        harness
            .surface
            .embed(surface)
            .and_then(|embed| embed.footer)
            .map(|footer| footer.text)
    };
    assert_eq!(harness.surface.content(root).as_deref(), Some(""));
    assert_eq!(footer(root).as_deref(), Some("p.1 of 2"));

    harness.press(root, NEXT_PAGE, AUTHOR).await;
    assert_eq!(
        harness.surface.embed(root).and_then(|embed| embed.description).as_deref(),
        Some("beta")
    );
    assert_eq!(footer(root).as_deref(), Some("p.2 of 2"));

    handle.kill(CleanupAction::NOTHING);
    handle.finished().await.unwrap();
}

#[test]
fn page_bytes_grow_with_page_text() {
    let harness = Harness::new();
    let navigator = harness.navigator(
        vec!["a".repeat(10), "b".repeat(20)],
        default_buttons(),
        Invocation::new(AUTHOR),
        config(),
    );

    let state = navigator.state().unwrap();
    assert_eq!(state.page_bytes(), 2 * std::mem::size_of::<Page>() + 30);
}

#[test]
fn invalid_configurations_are_rejected() {
    let harness = Harness::new();
    let build = |pages: Vec<String>, buttons: Vec<Button>, config: NavigatorConfig| {
        Navigator::new(
            harness.surface.clone(),
            harness.hub.clone(),
            pages,
            buttons,
            Invocation::new(AUTHOR),
            config,
        )
    };

    assert!(matches!(
        build(Vec::new(), default_buttons(), config()),
        Err(NavigatorError::EmptyPages)
    ));
    assert!(matches!(
        build(vec!["a".into(), String::new()], default_buttons(), config()),
        Err(NavigatorError::EmptyPage { index: 1 })
    ));
    assert!(matches!(
        build(
            pages(2),
            default_buttons(),
            NavigatorConfig {
                timeout: Duration::ZERO,
                ..config()
            }
        ),
        Err(NavigatorError::InvalidTimeout)
    ));

    let mut buttons = default_buttons();
    buttons.push(default_buttons().remove(0));
    assert!(matches!(
        build(pages(2), buttons, config()),
        Err(NavigatorError::DuplicateSymbol(_))
    ));
}
