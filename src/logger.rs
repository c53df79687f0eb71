use anyhow::Context;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Maps `-v`/`-q` flags to a maximum level. INFO unless told otherwise.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

// Initializer for logger. Logs go to stderr so stdout stays for reports.
pub fn init(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set up the global logger")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(level_for(3, true), Level::ERROR);
    }

    #[test]
    fn verbosity_steps_up() {
        assert_eq!(level_for(0, false), Level::INFO);
        assert_eq!(level_for(1, false), Level::DEBUG);
        assert_eq!(level_for(2, false), Level::TRACE);
        assert_eq!(level_for(9, false), Level::TRACE);
    }
}
