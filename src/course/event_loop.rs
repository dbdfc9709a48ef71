//! A scripted walkthrough of the event loop running a four-line program,
//! and the player that steps through it.

use serde::Serialize;

/// The program the walkthrough replays, one entry per source line.
pub const PROGRAM: [&str; 11] = [
    "console.log(\"Start\");",
    "",
    "setTimeout(() => {",
    "  console.log(\"Timeout\");",
    "}, 0);",
    "",
    "Promise.resolve().then(() => {",
    "  console.log(\"Promise\");",
    "});",
    "",
    "console.log(\"End\");",
];

/// The order in which the program prints.
pub const EXPECTED_OUTPUT: [&str; 4] = ["Start", "End", "Promise", "Timeout"];

/// Panel of the runtime a step draws attention to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Panel {
    CallStack,
    WebApis,
    MicrotaskQueue,
}

/// Which queue the event loop is taking work from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Arrow {
    Microtask,
    Macrotask,
}

/// A snapshot of the runtime at one point of the walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: &'static str,
    pub call_stack: &'static [&'static str],
    pub web_apis: &'static [&'static str],
    pub macrotask_queue: &'static [&'static str],
    pub microtask_queue: &'static [&'static str],
    pub description: &'static str,
    pub code: &'static str,
    pub highlight: Option<Panel>,
    pub arrow: Option<Arrow>,
    pub output: Option<&'static str>,
    /// 1-based line of [`PROGRAM`] being executed, `None` once finished.
    pub code_line: Option<usize>,
}

const NONE: &[&str] = &[];
const TIMER: &[&str] = &["setTimeout 0ms"];
const THEN: &[&str] = &[".then callback"];
const TIMEOUT_CALLBACK: &[&str] = &["setTimeout callback"];

const START_LOG: &str = "console.log(\"Start\");";
const SET_TIMEOUT: &str = "setTimeout(() => {...}, 0);";
const PROMISE: &str = "Promise.resolve().then(...)";
const END_LOG: &str = "console.log(\"End\");";
const PROMISE_LOG: &str = "console.log(\"Promise\");";
const TIMEOUT_LOG: &str = "console.log(\"Timeout\");";

/// The walkthrough, from an idle engine to the finished program.
pub const STEPS: [Step; 14] = [
    Step {
        name: "Start",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "JavaScript engine is ready to execute code",
        code: START_LOG,
        highlight: None,
        arrow: None,
        output: None,
        code_line: None,
    },
    Step {
        name: "Execute console.log",
        call_stack: &["console.log(\"Start\")"],
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "Synchronous code is pushed to the Call Stack",
        code: START_LOG,
        highlight: Some(Panel::CallStack),
        arrow: None,
        output: None,
        code_line: Some(1),
    },
    Step {
        name: "Output \"Start\"",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "Function executes and is removed from stack",
        code: START_LOG,
        highlight: None,
        arrow: None,
        output: Some("Start"),
        code_line: Some(1),
    },
    Step {
        name: "setTimeout called",
        call_stack: &["setTimeout(...)"],
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "setTimeout is called and added to Call Stack",
        code: SET_TIMEOUT,
        highlight: Some(Panel::CallStack),
        arrow: None,
        output: None,
        code_line: Some(3),
    },
    Step {
        name: "Sent to Web API",
        call_stack: NONE,
        web_apis: TIMER,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "setTimeout is handled by Web API, removed from stack",
        code: SET_TIMEOUT,
        highlight: Some(Panel::WebApis),
        arrow: None,
        output: None,
        code_line: Some(3),
    },
    Step {
        name: "Promise created",
        call_stack: &["Promise.resolve()"],
        web_apis: TIMER,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "Promise is created in Call Stack",
        code: PROMISE,
        highlight: Some(Panel::CallStack),
        arrow: None,
        output: None,
        code_line: Some(7),
    },
    Step {
        name: "Promise resolved",
        call_stack: NONE,
        web_apis: TIMER,
        macrotask_queue: NONE,
        microtask_queue: THEN,
        description: "Promise callback added to Microtask Queue",
        code: PROMISE,
        highlight: Some(Panel::MicrotaskQueue),
        arrow: None,
        output: None,
        code_line: Some(7),
    },
    Step {
        name: "More sync code",
        call_stack: &["console.log(\"End\")"],
        web_apis: TIMER,
        macrotask_queue: NONE,
        microtask_queue: THEN,
        description: "Continue executing synchronous code",
        code: END_LOG,
        highlight: Some(Panel::CallStack),
        arrow: None,
        output: None,
        code_line: Some(11),
    },
    Step {
        name: "Output \"End\"",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: TIMEOUT_CALLBACK,
        microtask_queue: THEN,
        description: "Sync code done. setTimeout ready, moved to Macrotask Queue",
        code: END_LOG,
        highlight: None,
        arrow: None,
        output: Some("End"),
        code_line: Some(11),
    },
    Step {
        name: "Process Microtasks",
        call_stack: THEN,
        web_apis: NONE,
        macrotask_queue: TIMEOUT_CALLBACK,
        microtask_queue: NONE,
        description: "Event Loop: Microtasks have priority! Execute first",
        code: PROMISE_LOG,
        highlight: Some(Panel::CallStack),
        arrow: Some(Arrow::Microtask),
        output: None,
        code_line: Some(8),
    },
    Step {
        name: "Output \"Promise\"",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: TIMEOUT_CALLBACK,
        microtask_queue: NONE,
        description: "Microtask complete, removed from stack",
        code: PROMISE_LOG,
        highlight: None,
        arrow: None,
        output: Some("Promise"),
        code_line: Some(8),
    },
    Step {
        name: "Process Macrotask",
        call_stack: TIMEOUT_CALLBACK,
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "Now execute Macrotask (setTimeout callback)",
        code: TIMEOUT_LOG,
        highlight: Some(Panel::CallStack),
        arrow: Some(Arrow::Macrotask),
        output: None,
        code_line: Some(4),
    },
    Step {
        name: "Output \"Timeout\"",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "All tasks complete! Event Loop is idle",
        code: TIMEOUT_LOG,
        highlight: None,
        arrow: None,
        output: Some("Timeout"),
        code_line: Some(4),
    },
    Step {
        name: "Complete",
        call_stack: NONE,
        web_apis: NONE,
        macrotask_queue: NONE,
        microtask_queue: NONE,
        description: "✅ Execution order: Start → End → Promise → Timeout",
        code: "",
        highlight: None,
        arrow: None,
        output: Some("Complete!"),
        code_line: None,
    },
];

/// Default delay between automatic steps.
pub const DEFAULT_SPEED_MS: u64 = 1500;

/// Position and play state of the walkthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    step: usize,
    playing: bool,
    speed_ms: u64,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            step: 0,
            playing: false,
            speed_ms: DEFAULT_SPEED_MS,
        }
    }
}

impl Player {
    pub fn new() -> Self {
        Player::default()
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn current(&self) -> &'static Step {
        &STEPS[self.step]
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_at_end(&self) -> bool {
        self.step == STEPS.len() - 1
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn set_speed_ms(&mut self, speed_ms: u64) {
        self.speed_ms = speed_ms;
    }

    /// Toggle playback. Starting from the last step rewinds first.
    pub fn play_pause(&mut self) {
        if self.is_at_end() {
            self.step = 0;
        }
        self.playing = !self.playing;
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.playing = false;
    }

    pub fn next(&mut self) {
        if !self.is_at_end() {
            self.step += 1;
        }
    }

    pub fn prev(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// Jump to `index`; out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) {
        if index < STEPS.len() {
            self.step = index;
        }
    }

    /// One timer tick while playing: advance until the last step.
    /// Returns whether the position changed.
    ///
    /// Reaching the end does not clear the play state, so the next
    /// [`play_pause`](Player::play_pause) rewinds and pauses.
    pub fn tick(&mut self) -> bool {
        if !self.playing || self.is_at_end() {
            return false;
        }
        self.step += 1;
        true
    }
}
