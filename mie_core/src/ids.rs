//! Identifier and timestamp assignment.
//!
//! Node identifiers are a variant prefix followed by a 16-character token
//! from a 36-symbol alphabet (~82 bits of entropy), making collisions
//! astronomically unlikely without any coordination.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

pub const FACT_PREFIX: &str = "fact:";
pub const DECISION_PREFIX: &str = "dec:";
pub const ENTITY_PREFIX: &str = "ent:";
pub const EVENT_PREFIX: &str = "evt:";
pub const TOPIC_PREFIX: &str = "top:";

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_TOKEN_LEN: usize = 16;

/// Allocate a fresh identifier with the given variant prefix.
pub fn new_node_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(prefix.len() + ID_TOKEN_LEN);
    id.push_str(prefix);
    for _ in 0..ID_TOKEN_LEN {
        id.push(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char);
    }
    id
}

/// The identifier prefix for a node variant name.
pub fn prefix_for(node_type: &str) -> Option<&'static str> {
    match node_type {
        "fact" => Some(FACT_PREFIX),
        "decision" => Some(DECISION_PREFIX),
        "entity" => Some(ENTITY_PREFIX),
        "event" => Some(EVENT_PREFIX),
        "topic" => Some(TOPIC_PREFIX),
        _ => None,
    }
}

/// Detect the node variant from an identifier prefix.
pub fn node_type_for_id(id: &str) -> Option<&'static str> {
    if id.starts_with(FACT_PREFIX) {
        Some("fact")
    } else if id.starts_with(DECISION_PREFIX) {
        Some("decision")
    } else if id.starts_with(ENTITY_PREFIX) {
        Some("entity")
    } else if id.starts_with(EVENT_PREFIX) {
        Some("event")
    } else if id.starts_with(TOPIC_PREFIX) {
        Some("topic")
    } else {
        None
    }
}

/// Integer seconds since the epoch. Captured once per store operation and
/// applied to both `created_at` and `updated_at`.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
