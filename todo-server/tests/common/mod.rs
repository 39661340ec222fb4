use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use todo_server::config::Config;
use todo_server::todo::MongoTodoStore;

/// Test context backed by a throwaway MongoDB container.
pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<Mongo>,
    #[allow(dead_code)] // only the endpoint tests build an app from it
    pub config: Config,
    pub store: MongoTodoStore,
}

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<Mongo>> {
    let container = Mongo::default().start().await?;
    Ok(container)
}

pub async fn setup_config(container: &testcontainers::ContainerAsync<Mongo>) -> anyhow::Result<Config> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(27017).await?;
    Ok(Config {
        mongo_uri: format!("mongodb://{}:{}", host, port),
        ..Config::default()
    })
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = setup_container().await?;
    let config = setup_config(&container).await?;
    let store = MongoTodoStore::connect(&config).await?;
    Ok(TestContext {
        container,
        config,
        store,
    })
}
