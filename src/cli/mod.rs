pub mod commands;

use crate::config::{BackendKind, Config};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kubedoom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kill Kubernetes pods by shooting monsters in DOOM", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to a YAML config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the virtual display and DOOM, then serve the control socket")]
    Run {
        #[command(flatten)]
        serve: ServeArgs,

        #[arg(
            long,
            help = "Don't use fancy vnc, throw DOOM straight up on the terminal screen"
        )]
        ascii_display: bool,
    },
    #[command(about = "Serve the control socket for an already running game")]
    Serve {
        #[command(flatten)]
        serve: ServeArgs,
    },
    #[command(about = "Print the monster identifier of qualified pod names")]
    Id {
        #[arg(required = true, help = "Pod names as namespace/name")]
        names: Vec<String>,
    },
    #[command(about = "List the pods a running server hands to the game")]
    List {
        #[arg(short, long, help = "Control socket path")]
        socket: Option<PathBuf>,
    },
    #[command(about = "Kill the pod behind a monster identifier")]
    Kill {
        #[arg(allow_negative_numbers = true, help = "Monster identifier")]
        id: i32,

        #[arg(short, long, help = "Control socket path")]
        socket: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(short, long, help = "Control socket path")]
    pub socket: Option<PathBuf>,

    #[arg(short, long, value_enum, help = "How to reach the cluster")]
    pub backend: Option<BackendKind>,
}

impl ServeArgs {
    /// Let flags given on the command line win over the config file
    pub fn apply(&self, config: &mut Config) {
        if let Some(socket) = &self.socket {
            config.server.socket_path = socket.clone();
        }
        if let Some(backend) = self.backend {
            config.backend.kind = backend;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_flags_override_config() {
        let cli = Cli::parse_from([
            "kubedoom",
            "serve",
            "--socket",
            "/tmp/doom.sock",
            "--backend",
            "api",
        ]);

        let Some(Commands::Serve { serve }) = cli.command else {
            panic!("expected serve command");
        };

        let mut config = Config::default();
        serve.apply(&mut config);
        assert_eq!(config.server.socket_path, PathBuf::from("/tmp/doom.sock"));
        assert_eq!(config.backend.kind, BackendKind::Api);
    }

    #[test]
    fn test_kill_accepts_negative_ids() {
        let cli = Cli::parse_from(["kubedoom", "kill", "-5"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Kill { id: -5, socket: None })
        ));
    }
}
