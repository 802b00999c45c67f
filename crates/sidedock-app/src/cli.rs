use clap::{Args as ClapArgs, Parser, Subcommand};

/// sidedock: keeps companion windows docked beside their anchor window.
#[derive(Parser, Debug)]
#[command(name = "sidedock", version, about)]
pub struct Args {
    /// Config file path override (also read from `SIDEDOCK_CONFIG`).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the engine against an in-memory host.
    Run(RunArgs),
    /// Print the effective configuration as JSON.
    Config,
    /// Classify the windows of a seeded in-memory host and print the result.
    Discover,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Number of anchor windows to open.
    #[arg(long, default_value_t = 2)]
    pub anchors: usize,

    /// How long to run before shutting down.
    #[arg(long, default_value_t = 10)]
    pub duration_secs: u64,

    /// Move the anchors once per second.
    #[arg(long)]
    pub drift: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            anchors: 2,
            duration_secs: 10,
            drift: false,
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let args = Args::parse_from([
            "sidedock",
            "--log-level",
            "debug",
            "run",
            "--anchors",
            "3",
            "--drift",
        ]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        let Some(Command::Run(run)) = args.command else {
            panic!("expected run command");
        };
        assert_eq!(run.anchors, 3);
        assert_eq!(run.duration_secs, 10);
        assert!(run.drift);
    }

    #[test]
    fn command_is_optional() {
        let args = Args::parse_from(["sidedock", "--config", "/tmp/sidedock.toml"]);
        assert!(args.command.is_none());
        assert_eq!(args.config.as_deref(), Some("/tmp/sidedock.toml"));
    }
}
