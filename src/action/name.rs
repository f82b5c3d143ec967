/*!
 * Action Names
 * Derives a human readable name from the clicked element
 *
 * Resolution order:
 * 1. the programmatic name attribute on the element or an ancestor
 * 2. label, input value, button text, aria-label, title, placeholder,
 *    walking up the ancestors
 * 3. text content, walking up the ancestors
 *
 * The walk stops at document roots and after a form element.
 */

use crate::core::limits::{ACTION_NAME_ATTRIBUTE, ACTION_NAME_MAX_LENGTH, ACTION_NAME_MAX_PARENTS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of an element and its ancestors, captured at click time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    /// Upper-case tag name, e.g. `BUTTON`
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    /// Current value of form controls
    pub value: Option<String>,
    /// Text content
    pub text: Option<String>,
    /// Text of the associated label
    pub label: Option<String>,
    pub parent: Option<Box<ElementSnapshot>>,
}

impl ElementSnapshot {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_parent(mut self, parent: ElementSnapshot) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    fn is_document_root(&self) -> bool {
        self.is("BODY") || self.is("HTML") || self.is("HEAD")
    }

    fn ancestors(&self) -> impl Iterator<Item = &ElementSnapshot> {
        std::iter::successors(Some(self), |element| element.parent.as_deref())
    }
}

type Strategy = fn(&ElementSnapshot) -> Option<&str>;

const PRIORITY_STRATEGIES: &[Strategy] = &[
    label_text,
    input_button_value,
    button_like_text,
    aria_label,
    title,
    placeholder,
];

const FALLBACK_STRATEGIES: &[Strategy] = &[text_content];

fn label_text(element: &ElementSnapshot) -> Option<&str> {
    element.label.as_deref()
}

fn input_button_value(element: &ElementSnapshot) -> Option<&str> {
    if !element.is("INPUT") {
        return None;
    }
    match element.attribute("type") {
        Some("button" | "submit" | "reset") => element.value.as_deref(),
        _ => None,
    }
}

fn button_like_text(element: &ElementSnapshot) -> Option<&str> {
    if element.is("BUTTON") || element.is("LABEL") || element.attribute("role") == Some("button") {
        element.text.as_deref()
    } else {
        None
    }
}

fn aria_label(element: &ElementSnapshot) -> Option<&str> {
    element.attribute("aria-label")
}

fn title(element: &ElementSnapshot) -> Option<&str> {
    element.attribute("title")
}

fn placeholder(element: &ElementSnapshot) -> Option<&str> {
    element.attribute("placeholder")
}

fn text_content(element: &ElementSnapshot) -> Option<&str> {
    element.text.as_deref()
}

/// Name of the action triggered on `target`; empty when nothing usable was found
pub fn action_name(target: &ElementSnapshot) -> String {
    programmatic_name(target)
        .or_else(|| name_from_strategies(target, PRIORITY_STRATEGIES))
        .or_else(|| name_from_strategies(target, FALLBACK_STRATEGIES))
        .unwrap_or_default()
}

fn programmatic_name(target: &ElementSnapshot) -> Option<String> {
    target
        .ancestors()
        .find_map(|element| element.attribute(ACTION_NAME_ATTRIBUTE))
        .map(|name| truncate(&normalize_whitespace(name.trim())))
}

fn name_from_strategies(target: &ElementSnapshot, strategies: &[Strategy]) -> Option<String> {
    for element in target.ancestors().take(ACTION_NAME_MAX_PARENTS + 1) {
        if element.is_document_root() {
            break;
        }

        for strategy in strategies {
            if let Some(name) = strategy(element) {
                let trimmed = name.trim();
                if !trimmed.is_empty() {
                    return Some(truncate(&normalize_whitespace(trimmed)));
                }
            }
        }

        if element.is("FORM") {
            break;
        }
    }
    None
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= ACTION_NAME_MAX_LENGTH {
        return value.to_string();
    }
    let truncated: String = value.chars().take(ACTION_NAME_MAX_LENGTH).collect();
    format!("{truncated} [...]")
}
