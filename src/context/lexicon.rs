//! Frozen lookup tables used by tokenization and task analysis

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Words dropped before counting or matching
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "with", "for", "from", "into", "onto", "about", "without",
        "to", "of", "in", "on", "by", "is", "are", "be", "create", "build", "make",
    ]
    .into_iter()
    .collect()
});

/// Keyword → canonical domain
pub static DOMAIN_GLOSSARY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("account", "user"),
        ("accounts", "user"),
        ("billing", "billing"),
        ("customer", "user"),
        ("customers", "user"),
        ("event", "events"),
        ("events", "events"),
        ("inventory", "inventory"),
        ("order", "order"),
        ("orders", "order"),
        ("payment", "billing"),
        ("payments", "billing"),
        ("project", "project"),
        ("projects", "project"),
        ("specification", "specifications"),
        ("specs", "specifications"),
        ("user", "user"),
        ("users", "user"),
    ]
    .into_iter()
    .collect()
});

/// Tag separators used when expanding `domain:user` style tags
pub const TAG_SEPARATORS: [char; 4] = [':', '/', '_', '-'];
