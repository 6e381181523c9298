use crate::cli::{Commands, ServeArgs};
use crate::config::Config;
use crate::k8s::{self, PodRef};
use crate::server::Server;
use crate::{control, launcher, Result};
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Run {
            serve,
            ascii_display,
        } => handle_run(serve, ascii_display, config).await,
        Commands::Serve { serve } => handle_serve(serve, config).await,
        Commands::Id { names } => handle_id(names),
        Commands::List { socket } => handle_list(socket, config).await,
        Commands::Kill { id, socket } => handle_kill(id, socket, config).await,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn bind(serve: &ServeArgs, config: &mut Config) -> Result<Server> {
    serve.apply(config);
    let backend = k8s::connect(&config.backend).await?;
    Server::bind(&config.server, backend)
}

async fn handle_run(serve: ServeArgs, ascii_display: bool, mut config: Config) -> Result<()> {
    // The game asks for pods as soon as it starts, so the socket comes first
    let server = bind(&serve, &mut config).await?;
    let launched = launcher::launch(&config.launch, ascii_display).await?;

    info!("kubedoom running. Press Ctrl+C to exit.");
    let result = server.run_until(shutdown_signal()).await;

    launched.shutdown().await;
    info!("kubedoom stopped");
    result
}

async fn handle_serve(serve: ServeArgs, mut config: Config) -> Result<()> {
    let server = bind(&serve, &mut config).await?;

    info!("Serving {}. Press Ctrl+C to exit.", server.socket_path().display());
    server.run_until(shutdown_signal()).await
}

fn handle_id(names: Vec<String>) -> Result<()> {
    for name in names {
        let pod: PodRef = name.parse()?;
        println!("{:>10}  {}", pod.id(), pod);
    }
    Ok(())
}

fn socket_path(socket: Option<PathBuf>, config: &Config) -> PathBuf {
    socket.unwrap_or_else(|| config.server.socket_path.clone())
}

async fn handle_list(socket: Option<PathBuf>, config: Config) -> Result<()> {
    let socket = socket_path(socket, &config);
    let names = control::list(&socket, config.server.record_width).await?;

    if names.is_empty() {
        println!("No pods listed");
        return Ok(());
    }

    println!("{:>10}  {}", "ID", "NAMESPACE/POD");
    for name in names {
        println!("{:>10}  {}", kubedoom_common::pod_id(&name), name);
    }
    Ok(())
}

async fn handle_kill(id: i32, socket: Option<PathBuf>, config: Config) -> Result<()> {
    let socket = socket_path(socket, &config);
    control::kill(&socket, id).await?;
    println!("Sent kill {} to {}", id, socket.display());
    Ok(())
}
