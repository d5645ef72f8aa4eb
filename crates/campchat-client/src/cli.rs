use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "campchat")]
#[command(version, about = "Chat with the Summer Camp assistant from a terminal")]
pub struct Cli {
    /// Relay chat endpoint
    #[arg(
        long,
        env = "CAMPCHAT_RELAY_URL",
        default_value = "http://127.0.0.1:8080/chat"
    )]
    pub relay_url: String,

    /// Bearer token presented to the relay
    #[arg(long, env = "CAMPCHAT_RELAY_TOKEN")]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "campchat",
            "--relay-url",
            "http://relay.test/chat",
            "--token",
            "pk_live",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.relay_url, "http://relay.test/chat");
        assert_eq!(cli.token.as_deref(), Some("pk_live"));
        assert!(cli.verbose);
    }
}
