use crate::env::{parse_number, EnvSource};
use crate::error::{MissingValueError, StreamSQLError, StreamSQLResult};
use crate::source::config::{default_history_topic, SourceConfig, TunableOverrides};
use log::{info, warn};

const DEFAULT_SOURCE_PORT: u16 = 1433;

/// Every valid source found in the environment, in index order.
///
/// Built once at startup and handed by reference to the components that
/// need it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        SourceRegistry { sources }
    }

    /// Fails only when not a single valid source could be read.
    pub fn load(env: &dyn EnvSource) -> StreamSQLResult<Self> {
        let sources = load_sources(env);
        if sources.is_empty() {
            return Err(StreamSQLError::ConfigError(
                "no valid database configuration found, check the DB{n}_* variables".into(),
            ));
        }
        Ok(SourceRegistry { sources })
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Probes `DB1_HOSTNAME`, `DB2_HOSTNAME`, ... until an index has no hostname.
/// Incomplete entries are logged and skipped without ending the scan.
pub fn load_sources(env: &dyn EnvSource) -> Vec<SourceConfig> {
    let mut sources = vec![];
    let mut index = 1;

    while env.var(&format!("DB{}_HOSTNAME", index)).is_some() {
        match parse_source(index, env) {
            Ok(source) => {
                info!(
                    "Found configuration for DB{}: {}.{}",
                    index, source.server_name, source.database
                );
                sources.push(source);
            }
            Err(err) => warn!("Skipping DB{}: {}", index, err),
        }
        index += 1;
    }

    sources
}

pub fn parse_source(index: u32, env: &dyn EnvSource) -> StreamSQLResult<SourceConfig> {
    let prefix = format!("DB{}", index);
    let key = |field: &str| format!("{}_{}", prefix, field);

    let missing: Vec<String> = ["HOSTNAME", "USER", "PASSWORD", "NAME", "SERVER_NAME"]
        .iter()
        .map(|field| key(*field))
        .filter(|k| env.var(k).is_none())
        .collect();
    if let Some(first) = missing.first() {
        if missing.len() == 1 {
            return Err(MissingValueError::new(first.clone()).into());
        }
        return Err(StreamSQLError::ConfigError(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    let required = |field: &str| -> StreamSQLResult<String> {
        let k = key(field);
        env.var(&k).ok_or_else(|| MissingValueError::new(k).into())
    };

    let port = match env.var(&key("PORT")) {
        Some(port) => parse_number::<u16>(&key("PORT"), &port)?,
        None => DEFAULT_SOURCE_PORT,
    };

    Ok(SourceConfig {
        index,
        hostname: required("HOSTNAME")?,
        port,
        user: required("USER")?,
        password: required("PASSWORD")?,
        database: required("NAME")?,
        server_name: required("SERVER_NAME")?,
        tables: parse_table_list(&env.var(&key("TABLE_INCLUDE_LIST")).unwrap_or_default()),
        history_topic: env
            .var(&key("HISTORY_TOPIC"))
            .unwrap_or_else(|| default_history_topic(index)),
        overrides: TunableOverrides {
            tasks_max: env.var(&key("TASKS_MAX")),
            snapshot_mode: env.var(&key("SNAPSHOT_MODE")),
            replication_factor: env.var(&key("TOPIC_CREATION_REPLICATION_FACTOR")),
            partitions: env.var(&key("TOPIC_CREATION_PARTITIONS")),
        },
    })
}

pub fn parse_table_list(table_list: &str) -> Vec<String> {
    table_list
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::env_from;

    fn full_source(n: u32, server: &str) -> Vec<(String, String)> {
        vec![
            (format!("DB{}_HOSTNAME", n), format!("host{}", n)),
            (format!("DB{}_USER", n), "sa".to_string()),
            (format!("DB{}_PASSWORD", n), "secret".to_string()),
            (format!("DB{}_NAME", n), "TestCDC".to_string()),
            (format!("DB{}_SERVER_NAME", n), server.to_string()),
        ]
    }

    fn to_env(pairs: Vec<(String, String)>) -> std::collections::HashMap<String, String> {
        pairs.into_iter().collect()
    }

    #[test]
    fn test_parse_table_list() {
        assert_eq!(
            parse_table_list(" dbo.Customers , ,dbo.Orders,"),
            vec!["dbo.Customers".to_string(), "dbo.Orders".to_string()]
        );
        assert!(parse_table_list("").is_empty());
        assert!(parse_table_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_source_defaults() {
        let env = to_env(full_source(1, "srv1"));
        let source = parse_source(1, &env).unwrap();
        assert_eq!(source.port, 1433);
        assert_eq!(source.history_topic, "dbhistory.sql-server-cdc-db1");
        assert!(source.tables.is_empty());
        assert_eq!(source.overrides, TunableOverrides::default());
    }

    #[test]
    fn test_parse_source_with_overrides() {
        let mut pairs = full_source(2, "srv2");
        pairs.push(("DB2_PORT".into(), "1533".into()));
        pairs.push(("DB2_TABLE_INCLUDE_LIST".into(), "dbo.A, dbo.B".into()));
        pairs.push(("DB2_HISTORY_TOPIC".into(), "history.two".into()));
        pairs.push(("DB2_TASKS_MAX".into(), "3".into()));
        pairs.push(("DB2_TOPIC_CREATION_PARTITIONS".into(), "6".into()));
        let env = to_env(pairs);

        let source = parse_source(2, &env).unwrap();
        assert_eq!(source.port, 1533);
        assert_eq!(source.tables, vec!["dbo.A".to_string(), "dbo.B".to_string()]);
        assert_eq!(source.history_topic, "history.two");
        assert_eq!(source.overrides.tasks_max.as_deref(), Some("3"));
        assert_eq!(source.overrides.partitions.as_deref(), Some("6"));
        assert_eq!(source.overrides.snapshot_mode, None);
    }

    #[test]
    fn test_parse_source_missing_single_field() {
        let mut pairs = full_source(1, "srv1");
        pairs.retain(|(k, _)| k != "DB1_PASSWORD");
        let env = to_env(pairs);
        match parse_source(1, &env) {
            Err(StreamSQLError::MissingValueError(err)) => {
                assert_eq!(err.field_name, "DB1_PASSWORD")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_source_invalid_port() {
        let mut pairs = full_source(1, "srv1");
        pairs.push(("DB1_PORT".into(), "14x3".into()));
        let env = to_env(pairs);
        assert!(matches!(
            parse_source(1, &env),
            Err(StreamSQLError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_skips_invalid_and_continues_scan() {
        let mut pairs = full_source(1, "srv1");
        pairs.push(("DB2_HOSTNAME".into(), "host2".into()));
        pairs.extend(full_source(3, "srv3"));
        let env = to_env(pairs);

        let registry = SourceRegistry::load(&env).unwrap();
        let servers: Vec<&str> = registry
            .sources()
            .iter()
            .map(|s| s.server_name.as_str())
            .collect();
        assert_eq!(servers, vec!["srv1", "srv3"]);
        assert_eq!(registry.sources()[1].index, 3);
    }

    #[test]
    fn test_load_stops_at_first_missing_hostname() {
        let mut pairs = full_source(1, "srv1");
        pairs.extend(full_source(3, "srv3"));
        let env = to_env(pairs);
        let registry = SourceRegistry::load(&env).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_without_any_valid_source_fails() {
        let env = env_from(&[("DB1_HOSTNAME", "host1")]);
        assert!(matches!(
            SourceRegistry::load(&env),
            Err(StreamSQLError::ConfigError(_))
        ));
    }
}
