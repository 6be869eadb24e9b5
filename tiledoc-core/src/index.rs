//! The built corpus and the total order over its topics.

use crate::models::{Function, Topic};
use std::cmp::Ordering;
use tiledoc_types::TopicId;

/// Ordered topics first by key, then the rest by title.
pub fn topic_order(a: &Topic, b: &Topic) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
    .then_with(|| a.title.cmp(&b.title))
    .then_with(|| a.id.cmp(&b.id))
}

/// Every topic with its enriched functions, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    topics: Vec<Topic>,
}

impl Corpus {
    pub fn new(mut topics: Vec<Topic>) -> Self {
        topics.sort_by(topic_order);
        Self { topics }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| &t.id == id)
    }

    pub fn find_function(&self, name: &str) -> Option<(&Topic, &Function)> {
        self.topics
            .iter()
            .find_map(|t| t.functions.get(name).map(|f| (t, f)))
    }

    /// All functions, topic by topic, each topic's functions by name.
    pub fn functions(&self) -> impl Iterator<Item = (&Topic, &Function)> + '_ {
        self.topics
            .iter()
            .flat_map(|t| t.sorted_functions().into_iter().map(move |f| (t, f)))
    }

    pub fn function_count(&self) -> usize {
        self.topics.iter().map(|t| t.functions.len()).sum()
    }
}
