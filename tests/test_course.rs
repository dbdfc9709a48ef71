//! Course content tests: topic navigation and the event-loop player.

extern crate jsprimer;

use jsprimer::course::event_loop::{
    Arrow, Panel, Player, DEFAULT_SPEED_MS, EXPECTED_OUTPUT, PROGRAM, STEPS,
};
use jsprimer::course::topics;
use jsprimer::snippet::{ExecutionResult, SnippetExecutor};

/// Helper to advance a playing player until it stops, counting ticks.
fn play_to_end(player: &mut Player) -> usize {
    let mut ticks = 0;
    while player.tick() {
        ticks += 1;
        assert!(ticks <= STEPS.len(), "player never stopped");
    }
    ticks
}

// ============================================================================
// Topics
// ============================================================================

#[test]
fn test_topic_order() {
    let ids: Vec<&str> = topics::all().iter().map(|t| t.id).collect();
    assert_eq!(
        ids,
        vec![
            "es-standards",
            "data-types",
            "variables",
            "functions",
            "arrays",
            "conditions",
            "ternary",
            "callbacks",
            "promises",
            "async-await",
            "event-loop",
        ]
    );
}

#[test]
fn test_topic_lookup() {
    let topic = topics::by_id("promises").unwrap();
    assert_eq!(topic.order, 9);
    assert_eq!(topic.path, "/topic/promises");
    assert!(topics::by_id("generators").is_none());
}

#[test]
fn test_topic_navigation() {
    assert_eq!(topics::next("variables").unwrap().id, "functions");
    assert_eq!(topics::previous("variables").unwrap().id, "data-types");
    assert!(topics::next("event-loop").is_none());
    assert!(topics::previous("es-standards").is_none());
}

#[test]
fn test_unknown_topic_navigation() {
    assert_eq!(topics::next("unknown").unwrap().id, "es-standards");
    assert!(topics::previous("unknown").is_none());
}

#[test]
fn test_topics_serialize() {
    let json = serde_json::to_value(topics::by_id("event-loop").unwrap()).unwrap();
    assert_eq!(json["title"], "Event Loop & V8");
    assert_eq!(json["order"], 11);
}

// ============================================================================
// Walkthrough data
// ============================================================================

#[test]
fn test_walkthrough_bounds() {
    assert_eq!(STEPS.len(), 14);
    assert_eq!(STEPS[0].name, "Start");
    assert_eq!(STEPS[13].name, "Complete");
    assert_eq!(STEPS[13].output, Some("Complete!"));
    assert!(STEPS[13].code_line.is_none());
}

#[test]
fn test_microtasks_run_before_macrotasks() {
    let micro = STEPS
        .iter()
        .position(|s| s.arrow == Some(Arrow::Microtask))
        .unwrap();
    let macro_ = STEPS
        .iter()
        .position(|s| s.arrow == Some(Arrow::Macrotask))
        .unwrap();
    assert!(micro < macro_);
    assert_eq!(STEPS[micro].call_stack, &[".then callback"]);
    assert!(STEPS[micro].macrotask_queue.contains(&"setTimeout callback"));
}

#[test]
fn test_timer_moves_from_web_apis_to_queue() {
    let sent = STEPS.iter().find(|s| s.name == "Sent to Web API").unwrap();
    assert_eq!(sent.highlight, Some(Panel::WebApis));
    assert_eq!(sent.web_apis, &["setTimeout 0ms"]);

    let end = STEPS.iter().find(|s| s.output == Some("End")).unwrap();
    assert!(end.web_apis.is_empty());
    assert_eq!(end.macrotask_queue, &["setTimeout callback"]);
}

#[test]
fn test_step_json_shape() {
    let json = serde_json::to_value(&STEPS[9]).unwrap();
    assert_eq!(json["arrow"], "microtask");
    assert_eq!(json["highlight"], "callStack");
    assert_eq!(json["codeLine"], 8);
}

#[test]
fn test_program_synchronous_output_matches_executor() {
    // Deferred callbacks are dropped, so only the synchronous lines print.
    let code = PROGRAM.join("\n");
    let expected: Vec<&str> = EXPECTED_OUTPUT
        .iter()
        .copied()
        .filter(|line| *line == "Start" || *line == "End")
        .collect();
    assert_eq!(
        SnippetExecutor::new().run(&code),
        ExecutionResult::Success(expected.join("\n"))
    );
}

// ============================================================================
// Player
// ============================================================================

#[test]
fn test_player_defaults() {
    let player = Player::new();
    assert_eq!(player.step_index(), 0);
    assert!(!player.is_playing());
    assert_eq!(player.speed_ms(), DEFAULT_SPEED_MS);
    assert_eq!(DEFAULT_SPEED_MS, 1500);
}

#[test]
fn test_player_manual_navigation() {
    let mut player = Player::new();
    player.prev();
    assert_eq!(player.step_index(), 0);
    player.next();
    player.next();
    assert_eq!(player.current().name, "Output \"Start\"");
    player.jump_to(13);
    player.next();
    assert_eq!(player.step_index(), 13);
    player.jump_to(99);
    assert_eq!(player.step_index(), 13);
    player.reset();
    assert_eq!(player.step_index(), 0);
}

#[test]
fn test_tick_only_advances_while_playing() {
    let mut player = Player::new();
    assert!(!player.tick());
    assert_eq!(player.step_index(), 0);
    player.play_pause();
    assert!(player.tick());
    assert_eq!(player.step_index(), 1);
    player.play_pause();
    assert!(!player.tick());
    assert_eq!(player.step_index(), 1);
}

#[test]
fn test_playback_stops_at_last_step() {
    let mut player = Player::new();
    player.play_pause();
    assert_eq!(play_to_end(&mut player), STEPS.len() - 1);
    assert!(player.is_at_end());
    assert!(player.is_playing());
    assert!(!player.tick());
    assert!(player.is_at_end());
}

#[test]
fn test_play_pause_after_playback_rewinds_and_pauses() {
    let mut player = Player::new();
    player.play_pause();
    play_to_end(&mut player);
    player.play_pause();
    assert_eq!(player.step_index(), 0);
    assert!(!player.is_playing());
    assert!(!player.tick());
}

#[test]
fn test_play_at_end_restarts() {
    let mut player = Player::new();
    player.jump_to(STEPS.len() - 1);
    player.play_pause();
    assert!(player.is_playing());
    assert_eq!(player.step_index(), 0);
}

#[test]
fn test_reset_stops_playback() {
    let mut player = Player::new();
    player.play_pause();
    player.tick();
    player.set_speed_ms(500);
    player.reset();
    assert!(!player.is_playing());
    assert_eq!(player.step_index(), 0);
    assert_eq!(player.speed_ms(), 500);
}
