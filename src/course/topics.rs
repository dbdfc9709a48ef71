//! The ordered catalog of course topics.

use std::collections::HashMap;

use serde::Serialize;

/// One lesson of the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub path: &'static str,
    /// 1-based position in the course.
    pub order: u32,
}

const fn topic(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    path: &'static str,
    order: u32,
) -> Topic {
    Topic {
        id,
        title,
        description,
        path,
        order,
    }
}

lazy_static! {
    static ref TOPICS: Vec<Topic> = vec![
        topic(
            "es-standards",
            "ES Standards",
            "Understanding ECMAScript versions and modern JavaScript",
            "/topic/es-standards",
            1,
        ),
        topic(
            "data-types",
            "Data Types",
            "Primitive and Reference types in JavaScript",
            "/topic/data-types",
            2,
        ),
        topic(
            "variables",
            "Variables",
            "var, let, const and scoping in JavaScript",
            "/topic/variables",
            3,
        ),
        topic(
            "functions",
            "Functions & Arrow Functions",
            "Function declarations, expressions, and arrow syntax",
            "/topic/functions",
            4,
        ),
        topic(
            "arrays",
            "Arrays & Array Methods",
            "Essential array methods for React development",
            "/topic/arrays",
            5,
        ),
        topic(
            "conditions",
            "Conditions",
            "if/else statements and comparison operators",
            "/topic/conditions",
            6,
        ),
        topic(
            "ternary",
            "Ternary Operator",
            "Conditional expressions and JSX patterns",
            "/topic/ternary",
            7,
        ),
        topic(
            "callbacks",
            "Callbacks",
            "Understanding callback functions and asynchronous patterns",
            "/topic/callbacks",
            8,
        ),
        topic(
            "promises",
            "Promises",
            "Handling asynchronous operations",
            "/topic/promises",
            9,
        ),
        topic(
            "async-await",
            "Async/Await",
            "Modern async syntax and error handling",
            "/topic/async-await",
            10,
        ),
        topic(
            "event-loop",
            "Event Loop & V8",
            "JavaScript runtime and execution model",
            "/topic/event-loop",
            11,
        ),
    ];
    static ref INDEX_BY_ID: HashMap<&'static str, usize> = TOPICS
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, i))
        .collect();
}

/// Every topic, in course order.
pub fn all() -> &'static [Topic] {
    &TOPICS
}

pub fn by_id(id: &str) -> Option<&'static Topic> {
    INDEX_BY_ID.get(id).map(|&i| &TOPICS[i])
}

/// The topic after `id`. An unknown id counts as "before the first topic",
/// so its successor is the first topic.
pub fn next(id: &str) -> Option<&'static Topic> {
    match INDEX_BY_ID.get(id) {
        Some(&i) => TOPICS.get(i + 1),
        None => TOPICS.first(),
    }
}

/// The topic before `id`; `None` for the first topic and for unknown ids.
pub fn previous(id: &str) -> Option<&'static Topic> {
    match INDEX_BY_ID.get(id) {
        Some(&i) if i > 0 => TOPICS.get(i - 1),
        _ => None,
    }
}
