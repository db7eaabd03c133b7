use std::path::PathBuf;

use clap::{Parser, Subcommand};
use yogurt_chef::Result;
use yogurt_chef::commands::{ask, chat, index_corpus, list_languages, show_status};
use yogurt_chef::config::{Config, get_config_dir, run_interactive_config, show_config};
use yogurt_chef::language::Language;

#[derive(Parser)]
#[command(name = "yogurt-chef")]
#[command(about = "Yogurt recipe suggestions from your ingredients, grounded in a cookbook")]
#[command(version)]
struct Cli {
    /// Application directory holding config.toml and the index (default: ~/.yogurt-chef)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the corpus, model providers and translation
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the recipe index from the configured corpus
    Index {
        /// Discard the persisted index and embed the corpus again
        #[arg(long)]
        rebuild: bool,
    },
    /// Ask for recipes using the given ingredients
    Ask {
        /// Ingredients, e.g. "yoğurt dereotu salatalık"
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Display language code (tr, en, fr, de, es, ru)
        #[arg(long)]
        lang: Option<Language>,
        /// List the cookbook pages the answer was based on
        #[arg(long)]
        show_sources: bool,
    },
    /// Chat with the recipe assistant in the terminal
    Chat {
        /// Display language code; asked interactively when omitted
        #[arg(long)]
        lang: Option<Language>,
    },
    /// Show configuration, credentials and index status
    Status,
    /// List the supported display languages
    Languages,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(&config_dir)?);
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Index { rebuild } => {
            index_corpus(&config_dir, rebuild)?;
        }
        Commands::Ask {
            ingredients,
            lang,
            show_sources,
        } => {
            ask(&config_dir, &ingredients, lang, show_sources)?;
        }
        Commands::Chat { lang } => {
            chat(&config_dir, lang)?;
        }
        Commands::Status => {
            show_status(&config_dir)?;
        }
        Commands::Languages => {
            list_languages(&config_dir);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["yogurt-chef", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Status));
            assert_eq!(parsed.config_dir, None);
        }
    }

    #[test]
    fn ask_collects_ingredients() {
        let cli = Cli::try_parse_from([
            "yogurt-chef",
            "ask",
            "yoğurt",
            "dereotu",
            "--lang",
            "en",
            "--show-sources",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                ingredients,
                lang,
                show_sources,
            } = parsed.command
            {
                assert_eq!(ingredients, vec!["yoğurt", "dereotu"]);
                assert_eq!(lang, Some(Language::English));
                assert!(show_sources);
            } else {
                panic!("expected ask command");
            }
        }
    }

    #[test]
    fn ask_requires_ingredients() {
        let cli = Cli::try_parse_from(["yogurt-chef", "ask"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn language_accepts_names() {
        let cli = Cli::try_parse_from(["yogurt-chef", "chat", "--lang", "Deutsch"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Chat { lang } = parsed.command {
                assert_eq!(lang, Some(Language::German));
            }
        }
    }

    #[test]
    fn unknown_language_is_rejected() {
        let cli = Cli::try_parse_from(["yogurt-chef", "chat", "--lang", "xx"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn global_config_dir() {
        let cli = Cli::try_parse_from(["yogurt-chef", "index", "--rebuild", "--config-dir", "/tmp/yc"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.config_dir, Some(PathBuf::from("/tmp/yc")));
            assert!(matches!(parsed.command, Commands::Index { rebuild: true }));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["yogurt-chef", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["yogurt-chef", "serve"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["yogurt-chef", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
