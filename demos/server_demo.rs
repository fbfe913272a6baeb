use routex::{RoutexServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut config = ServerConfig::default();
    config.threads = 1;
    config.router.migration_threshold = 4;

    let builder = routex::demo::routes().with_config(config);
    let handle = RoutexServer::from_builder(builder)?.start()?;
    println!("routex demo on http://{}", handle.local_addr());
    println!("try: curl http://{}/users/42", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    tokio::task::spawn_blocking(move || handle.shutdown()).await??;
    Ok(())
}
