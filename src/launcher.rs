//! Starts the processes the game needs around the control socket
//!
//! In the default mode the game renders into a virtual framebuffer that is
//! exported over VNC. With `ascii_display` the framebuffer and VNC server are
//! skipped and the game inherits the terminal.

use crate::config::LaunchConfig;
use crate::{KubedoomError, Result};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Port x11vnc listens on unless told otherwise
pub const VNC_PORT: u16 = 5900;

/// Processes started by [`launch`]. They are killed when this is dropped.
pub struct Launched {
    children: Vec<(String, Child)>,
}

impl Launched {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Commands of the started processes, in start order
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(command, _)| command.as_str())
    }

    pub async fn shutdown(mut self) {
        for (command, child) in self.children.iter_mut().rev() {
            match child.kill().await {
                Ok(()) => debug!("Stopped `{}`", command),
                Err(e) => warn!("Failed to stop `{}`: {}", command, e),
            }
        }
    }
}

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn(command: &mut Command, description: String) -> Result<(String, Child)> {
    debug!("Starting `{}`", description);
    let child = command
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| KubedoomError::Launch {
            command: description.clone(),
            source,
        })?;
    Ok((description, child))
}

/// Start the display (unless `ascii_display`) and the game
pub async fn launch(config: &LaunchConfig, ascii_display: bool) -> Result<Launched> {
    let mut children = Vec::new();

    if !ascii_display {
        info!("Create virtual display");

        let xvfb = config.xvfb.display().to_string();
        let screen = format!("{}x24", config.geometry);
        let args = [config.display.as_str(), "-ac", "-screen", "0", screen.as_str()];
        children.push(spawn(
            Command::new(&config.xvfb).args(args),
            describe(&xvfb, &args),
        )?);

        tokio::time::sleep(config.display_settle()).await;

        let x11vnc = config.x11vnc.display().to_string();
        let args = [
            "-geometry",
            config.geometry.as_str(),
            "-forever",
            "-usepw",
            "-display",
            config.display.as_str(),
        ];
        children.push(spawn(
            Command::new(&config.x11vnc).args(args),
            describe(&x11vnc, &args),
        )?);

        info!(
            "You can now connect to it with a VNC viewer at port {}",
            VNC_PORT
        );
    }

    let (program, args) = config.game.split_first().ok_or_else(|| {
        KubedoomError::ConfigError("launch.game must name the game binary".to_string())
    })?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    info!("Trying to start DOOM ...");

    let mut game = Command::new(program);
    game.args(&args);
    if !ascii_display {
        game.env("DISPLAY", &config.display)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }
    children.push(spawn(&mut game, describe(program, &args))?);

    Ok(Launched { children })
}
