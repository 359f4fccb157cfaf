// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Key casing transforms.
//!
//! Wire keys are derived from declared property names by splitting them into
//! words and re-joining them in the requested style. The same splitter feeds
//! route paths (kebab-case) and synthesized definition names (PascalCase).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Casing applied to every object property name on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCasing {
    /// Keys are written exactly as declared.
    Identity,
    /// `user_id` -> `userId`
    #[default]
    Camel,
    /// `user_id` -> `UserId`
    Pascal,
    /// `userId` -> `user_id`
    Snake,
}

impl KeyCasing {
    /// Transform a declared key into its wire form.
    pub fn apply<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            Self::Identity => Cow::Borrowed(key),
            Self::Camel => Cow::Owned(to_camel(key)),
            Self::Pascal => Cow::Owned(to_pascal(key)),
            Self::Snake => Cow::Owned(to_snake(key)),
        }
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | '/') || c.is_whitespace()
}

/// Split an identifier into words on separators and case boundaries.
///
/// `HTTPServer_port2Id` -> `["HTTP", "Server", "port2", "Id"]`
pub(crate) fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub(crate) fn to_camel(input: &str) -> String {
    split_words(input)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

pub(crate) fn to_pascal(input: &str) -> String {
    split_words(input).iter().map(|w| capitalize(w)).collect()
}

pub(crate) fn to_snake(input: &str) -> String {
    join_lower(input, "_")
}

pub(crate) fn to_kebab(input: &str) -> String {
    join_lower(input, "-")
}

fn join_lower(input: &str, sep: &str) -> String {
    split_words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}
