use crate::source::SourceConfig;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Association of one broker topic with the source and table it carries.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicBinding {
    pub topic: String,
    pub source_id: String,
    pub server_name: String,
    pub database: String,
    pub table: String,
}

impl TopicBinding {
    /// Consumer group for this binding. Pure function of source and table,
    /// so a restarted worker joins the same group.
    pub fn consumer_group(&self, prefix: &str) -> String {
        format!(
            "{}-{}-{}",
            prefix,
            self.source_id.to_lowercase(),
            self.table.replace('.', "-")
        )
    }

    /// Short identity used as a log prefix, e.g. `DB1/dbo.Customers`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.source_id, self.table)
    }
}

/// Broker bookkeeping, connector runtime and schema history topics.
pub fn is_internal_topic(topic: &str) -> bool {
    let lower = topic.to_lowercase();
    topic.starts_with('_') || lower.contains("connect") || lower.contains("history")
}

/// `srv1-dbo_Customers.dbo.Customers` carries `dbo.Customers`. A topic with
/// a single segment yields that segment.
pub fn table_from_topic(topic: &str) -> String {
    let parts: Vec<&str> = topic.split('.').collect();
    match parts.as_slice() {
        [.., schema, table] => format!("{}.{}", schema, table),
        [single] => single.to_string(),
        [] => String::new(),
    }
}

/// Matches topics to sources by server-label prefix. When several labels are
/// prefixes of the same topic the longest one wins, so `srv1` never claims
/// the topics of `srv10`.
pub fn discover(topics: &[String], sources: &[SourceConfig]) -> Vec<TopicBinding> {
    let mut bindings = vec![];

    for topic in topics {
        if is_internal_topic(topic) {
            debug!("Ignoring internal topic {}", topic);
            continue;
        }

        let mut candidates: Vec<&SourceConfig> = sources
            .iter()
            .filter(|s| topic.starts_with(s.server_name.as_str()))
            .collect();
        candidates.sort_by_key(|s| std::cmp::Reverse(s.server_name.len()));

        let source = match candidates.first() {
            Some(source) => *source,
            None => {
                debug!("Topic {} matches no configured source", topic);
                continue;
            }
        };
        if candidates
            .iter()
            .skip(1)
            .any(|s| s.server_name == source.server_name)
        {
            warn!(
                "Topic {} matches several sources labelled {}, using {}",
                topic,
                source.server_name,
                source.source_id()
            );
        }

        let binding = TopicBinding {
            topic: topic.clone(),
            source_id: source.source_id(),
            server_name: source.server_name.clone(),
            database: source.database.clone(),
            table: table_from_topic(topic),
        };
        info!("Found topic {} for {}", topic, binding.label());
        bindings.push(binding);
    }

    bindings
}
