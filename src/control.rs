//! Client side of the control socket, for operators and tests
//!
//! Speaks exactly what the game speaks: one request per connection, answer
//! read until the server closes.

use crate::Result;
use kubedoom_common::{decode_records, Command};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

/// Send one request and collect everything the server writes back
pub async fn send(socket: &Path, command: &Command) -> Result<Vec<u8>> {
    let mut stream = UnixStream::connect(socket).await?;

    let request = command.to_request();
    debug!("Sending {:?} to {}", request, socket.display());
    stream.write_all(format!("{}\n", request).as_bytes()).await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(response)
}

/// Qualified names of the pods the server currently lists
pub async fn list(socket: &Path, record_width: usize) -> Result<Vec<String>> {
    let response = send(socket, &Command::List).await?;
    Ok(decode_records(&response, record_width))
}

/// Ask the server to delete the pod with identifier `id`.
///
/// Returns once the server has closed the connection; whether a pod matched
/// is only visible in a later listing.
pub async fn kill(socket: &Path, id: i32) -> Result<()> {
    send(socket, &Command::Kill(id)).await?;
    Ok(())
}
