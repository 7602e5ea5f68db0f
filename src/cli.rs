use clap::{Parser, Subcommand, ValueEnum};

/// `sousbot` — hands-free cooking assistant driven by a remote vision model.
#[derive(Parser, Debug)]
#[command(name = "sousbot")]
#[command(version = "0.1.0")]
#[command(about = "Point a camera at your stove and get spoken cooking guidance.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the camera loop (interactive or automatic)
    Assist {
        /// Loop mode; prompted for when omitted
        #[arg(long, value_enum)]
        mode: Option<AssistMode>,

        /// Seconds between analyses in automatic mode
        #[arg(long)]
        interval: Option<u64>,

        /// Question to ask with the first analysis
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the web server variant
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (use 0 for a random available port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssistMode {
    /// Press space to analyze
    Interactive,
    /// Analyze on a fixed interval
    Automatic,
}

/// Resolve the loop mode, prompting when the flag is absent. Anything other
/// than an explicit "automatic" choice falls back to interactive.
pub fn resolve_mode(mode: Option<AssistMode>) -> AssistMode {
    if let Some(mode) = mode {
        return mode;
    }

    let selection = dialoguer::Select::new()
        .with_prompt("Select mode")
        .items(&[
            "Interactive (press SPACE to analyze)",
            "Automatic (analyzes on a fixed interval)",
        ])
        .default(0)
        .interact_opt()
        .ok()
        .flatten();

    match selection {
        Some(1) => AssistMode::Automatic,
        _ => AssistMode::Interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assist_parses_mode_and_message() {
        let cli = Cli::parse_from([
            "sousbot", "assist", "--mode", "automatic", "--interval", "10", "-m", "what now?",
        ]);
        let Commands::Assist {
            mode,
            interval,
            message,
        } = cli.command
        else {
            panic!("expected assist");
        };
        assert_eq!(mode, Some(AssistMode::Automatic));
        assert_eq!(interval, Some(10));
        assert_eq!(message.as_deref(), Some("what now?"));
    }

    #[test]
    fn serve_parses_host_and_port() {
        let cli = Cli::parse_from(["sousbot", "serve", "--host", "0.0.0.0", "-p", "9000"]);
        let Commands::Serve { host, port } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(host.as_deref(), Some("0.0.0.0"));
        assert_eq!(port, Some(9000));
    }

    #[test]
    fn explicit_mode_skips_the_prompt() {
        assert_eq!(
            resolve_mode(Some(AssistMode::Automatic)),
            AssistMode::Automatic
        );
        assert_eq!(
            resolve_mode(Some(AssistMode::Interactive)),
            AssistMode::Interactive
        );
    }
}
