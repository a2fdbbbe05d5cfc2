use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::File;
use std::path::Path;

/// Default level for a `-v` count; `RUST_LOG` still takes precedence
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the global logger.
///
/// With `log_file`, records go there. Otherwise an interactive session
/// discards them (stderr would draw over the map) and batch commands
/// write to stderr.
pub fn init(verbose: u8, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level_for(verbose)).parse_default_env();

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file))).write_style(WriteStyle::Never);
        }
        None if interactive => {
            builder.target(Target::Pipe(Box::new(std::io::sink())));
        }
        None => {}
    }

    builder.try_init().context("Failed to install logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(5), LevelFilter::Debug);
    }
}
