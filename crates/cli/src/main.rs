use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ft_cli::cli::{self, Cli, Command, ConfigCommand};
use ft_domain::config::ObservabilityConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve { file, now } => {
            let (config, _) = cli::load_config()?;
            init_tracing(&config.observability);
            let job = cli::resolve::run(&config.timers, &file, now.as_deref())?;
            println!("{job}");
            Ok(())
        }
        Command::PrepareRepeat { cycle, now } => {
            let (config, _) = cli::load_config()?;
            init_tracing(&config.observability);
            println!("{}", cli::repeat::run(&config.timers, &cycle, now.as_deref())?);
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = cli::load_config()?;
            let valid = cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _config_path) = cli::load_config()?;
            print!("{}", cli::config::show(&config)?);
            Ok(())
        }
        Command::Version => {
            println!("flowtimer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize stderr tracing so stdout carries only command output.
///
/// `RUST_LOG` overrides the configured filter; `json = true` switches to
/// JSON lines.
fn init_tracing(obs: &ObservabilityConfig) {
    let directives = match obs.log_filter.trim() {
        "" => "info",
        filter => filter,
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    if obs.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}
