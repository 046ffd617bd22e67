use indexmap::IndexMap;
use serde::Serialize;

/// Validation messages grouped by attribute path, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageBag {
    messages: IndexMap<String, Vec<String>>,
}

impl MessageBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `key`. A message already recorded for the same
    /// key is not added twice.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        let list = self.messages.entry(key.into()).or_default();
        if !list.contains(&message) {
            list.push(message);
        }
        self
    }

    /// Messages for `key`; empty when there are none.
    pub fn get(&self, key: &str) -> &[String] {
        self.messages.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// The first message recorded, for any key.
    pub fn first(&self) -> Option<&str> {
        self.messages
            .values()
            .flat_map(|list| list.iter())
            .next()
            .map(String::as_str)
    }

    /// The first message recorded for `key`.
    pub fn first_for(&self, key: &str) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    /// Total number of messages across all keys.
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.messages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Vec<String>> {
        self.messages.iter()
    }

    /// Every message, flattened in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &str> + '_ {
        self.messages
            .values()
            .flat_map(|list| list.iter().map(String::as_str))
    }

    /// Append every message of `other`, keeping this bag's key order.
    pub fn merge(&mut self, other: MessageBag) -> &mut Self {
        for (key, list) in other.messages {
            for message in list {
                self.add(key.clone(), message);
            }
        }
        self
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.messages
    }
}

impl<'a> IntoIterator for &'a MessageBag {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
