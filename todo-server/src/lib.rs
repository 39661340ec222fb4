pub mod config {
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct Config {
        #[serde(default = "default_mongo_uri")]
        pub mongo_uri: String,
        #[serde(default = "default_db_name")]
        pub db_name: String,
        #[serde(default = "default_collection_name")]
        pub collection_name: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_timeout_secs")]
        pub read_timeout_secs: u64,
        #[serde(default = "default_timeout_secs")]
        pub write_timeout_secs: u64,
        #[serde(default = "default_shutdown_grace_secs")]
        pub shutdown_grace_secs: u64,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        pub fn read_timeout(&self) -> Duration {
            Duration::from_secs(self.read_timeout_secs)
        }

        pub fn write_timeout(&self) -> Duration {
            Duration::from_secs(self.write_timeout_secs)
        }

        /// How long in-flight requests may keep running once a shutdown signal arrives.
        pub fn shutdown_grace(&self) -> Duration {
            Duration::from_secs(self.shutdown_grace_secs)
        }
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                mongo_uri: default_mongo_uri(),
                db_name: default_db_name(),
                collection_name: default_collection_name(),
                port: default_port(),
                read_timeout_secs: default_timeout_secs(),
                write_timeout_secs: default_timeout_secs(),
                shutdown_grace_secs: default_shutdown_grace_secs(),
            }
        }
    }

    fn default_mongo_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }

    fn default_db_name() -> String {
        "demo_todo".to_string()
    }

    fn default_collection_name() -> String {
        "todo".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_timeout_secs() -> u64 {
        60
    }

    fn default_shutdown_grace_secs() -> u64 {
        5
    }

}

pub mod todo;
pub mod web;
