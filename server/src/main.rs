use careslot_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment: dotenv, work directory, logging
    let config = setup_environment()?;

    print_banner();

    tracing::info!("CareSlot server starting...");

    // 2. Initialize server state (database, JWT, bus, mailer)
    let state = ServerState::initialize(&config).await?;

    // 3. Run the HTTP server until ctrl-c
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
