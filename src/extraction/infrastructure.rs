//! Infrastructure kinds, their recognition signatures and detail extraction

use super::value::{get, get_path, scalar_to_string};
use serde_yaml::{Mapping, Value};

crate::define_kind_enum! {
    /// Infrastructure a service depends on
    InfrastructureKind {
        PostgreSql => "postgresql" : ["postgresql", "postgres", "psql", "jdbc:postgresql"],
        MySql => "mysql" : ["mysql", "mariadb", "jdbc:mysql"],
        Oracle => "oracle" : ["oracle", "jdbc:oracle"],
        SqlServer => "sqlserver" : ["sqlserver", "mssql", "jdbc:sqlserver"],
        H2 => "h2" : ["jdbc:h2", "org.h2"],
        Redis => "redis" : ["redis", "lettuce"],
        RabbitMq => "rabbitmq" : ["rabbitmq", "amqp"],
        Kafka => "kafka" : ["kafka", "bootstrap-servers"],
        ActiveMq => "activemq" : ["activemq", "broker-url"],
        MongoDb => "mongodb" : ["mongodb", "mongo"],
        Elasticsearch => "elasticsearch" : ["elasticsearch", "es"],
    }
}

/// Broad grouping of the kind vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfrastructureCategory {
    Database,
    Cache,
    MessageBroker,
    SearchEngine,
    Custom,
}

impl InfrastructureKind {
    pub fn category(&self) -> InfrastructureCategory {
        match self {
            Self::PostgreSql | Self::MySql | Self::Oracle | Self::SqlServer | Self::H2 => {
                InfrastructureCategory::Database
            }
            Self::MongoDb => InfrastructureCategory::Database,
            Self::Redis => InfrastructureCategory::Cache,
            Self::RabbitMq | Self::Kafka | Self::ActiveMq => InfrastructureCategory::MessageBroker,
            Self::Elasticsearch => InfrastructureCategory::SearchEngine,
            Self::Custom(_) => InfrastructureCategory::Custom,
        }
    }

    /// Infers a database engine from a datasource block's driver and URL
    pub fn from_datasource_hints(datasource: &Value) -> Option<Self> {
        let hints: Vec<String> = ["driver-class-name", "url", "jdbc-url"]
            .iter()
            .filter_map(|key| get(datasource, key).and_then(scalar_to_string))
            .map(|hint| hint.to_lowercase())
            .collect();

        Self::all_variants()
            .iter()
            .filter(|kind| kind.category() == InfrastructureCategory::Database)
            .find(|kind| {
                kind.aliases()
                    .iter()
                    .any(|alias| hints.iter().any(|hint| hint.contains(alias)))
            })
            .cloned()
    }

    /// Pulls the well-known sub-fields for this kind out of its config block
    ///
    /// Absent sub-fields are omitted. Scalars, sequences and custom kinds
    /// yield an empty mapping.
    pub fn extract_details(&self, value: &Value) -> Mapping {
        let mut details = Mapping::new();
        if !value.is_mapping() {
            return details;
        }

        let mut put = |name: &str, path: &[&str]| {
            if let Some(found) = get_path(value, path).filter(|v| !v.is_null()) {
                details.insert(Value::String(name.to_string()), found.clone());
            }
        };

        match self {
            Self::PostgreSql | Self::MySql | Self::Oracle | Self::SqlServer | Self::H2 => {
                put("url", &["url"]);
                put("username", &["username"]);
                put("driver", &["driver-class-name"]);
                put("pool_size", &["hikari", "maximum-pool-size"]);
            }
            Self::Redis => {
                put("host", &["host"]);
                put("port", &["port"]);
                put("database", &["database"]);
                put("timeout", &["timeout"]);
            }
            Self::RabbitMq => {
                put("host", &["host"]);
                put("port", &["port"]);
                put("username", &["username"]);
                put("virtual_host", &["virtual-host"]);
            }
            Self::ActiveMq => {
                put("broker_url", &["broker-url"]);
                put("username", &["user"]);
            }
            Self::Kafka => {
                put("bootstrap_servers", &["bootstrap-servers"]);
                put("consumer_group", &["consumer", "group-id"]);
                put("producer_config", &["producer"]);
            }
            Self::MongoDb => {
                put("uri", &["uri"]);
                put("host", &["host"]);
                put("port", &["port"]);
                put("database", &["database"]);
            }
            Self::Elasticsearch => {
                put("uris", &["uris"]);
                put("username", &["username"]);
            }
            Self::Custom(_) => {}
        }

        details
    }
}
