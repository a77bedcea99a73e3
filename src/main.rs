mod cli;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use console::style;

use singscore::analysis::analyzer::{self, Analyzer};
use singscore::config::{self, AppConfig};
use singscore::storage::{contour_file, store};
use singscore::{logging, paths, report};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = config::load_config()?;

    match cli.command {
        Command::Score {
            performance,
            reference,
            song_id,
            title,
            user,
            json,
            no_save,
        } => {
            let analyzer = Analyzer::from_config(&config);
            let report = analyzer.score(&performance, &reference)?;

            let song_id = song_id.unwrap_or_else(|| analyzer::song_id_for(&reference));
            let title = title.unwrap_or_else(|| song_id.clone());

            if json {
                let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
                println!("{out}");
            } else {
                println!();
                report::print_report(&title, &report);
            }

            if !no_save {
                let username = username(user, &config);
                let key = analyzer::save_to_history(&report, &song_id, &title, &username)?;
                eprintln!();
                eprintln!("Saved to session {}", style(key).green());
            }
            Ok(())
        }

        Command::Quick {
            performance,
            reference,
        } => {
            let score = Analyzer::from_config(&config).quick_score(&performance, &reference)?;
            report::print_quick_score(score);
            Ok(())
        }

        Command::Extract { input, output } => {
            let contour = Analyzer::from_config(&config).detect_file(&input)?;
            match output {
                Some(path) => {
                    contour_file::save_contour(&path, &contour)?;
                    eprintln!("Contour saved to {}", style(path.display()).green());
                    Ok(())
                }
                None => contour_file::write_contour(io::stdout().lock(), &contour),
            }
        }

        Command::Align {
            source,
            grid,
            output,
        } => {
            let analyzer = Analyzer::from_config(&config);
            let grid = analyzer.load_contour(&grid)?;
            let source = analyzer.load_contour(&source)?;
            let aligned = analyzer.align_to(&source, &grid)?;
            match output {
                Some(path) => {
                    contour_file::save_contour(&path, &aligned)?;
                    eprintln!("Aligned contour saved to {}", style(path.display()).green());
                    Ok(())
                }
                None => contour_file::write_contour(io::stdout().lock(), &aligned),
            }
        }

        Command::Sessions { user } => {
            let sessions = store::list_sessions(user.as_deref())?;
            report::print_sessions(&sessions);
            Ok(())
        }

        Command::Session { key } => {
            let session = store::load_session(&key)?;
            report::print_session(&session);
            Ok(())
        }

        Command::Stats { user } => {
            let stats = store::user_stats(&username(user, &config))?;
            report::print_stats(&stats);
            Ok(())
        }

        Command::Top { user, limit } => {
            let username = username(user, &config);
            let songs = store::top_songs(&username, limit)?;
            report::print_top_songs(&username, &songs);
            Ok(())
        }

        Command::Paths => {
            println!("Config:   {}", paths::config_file().display());
            println!("Data:     {}", paths::data_dir().display());
            println!("Database: {}", paths::db_path().display());
            Ok(())
        }
    }
}

fn username(user: Option<String>, config: &AppConfig) -> String {
    user.unwrap_or_else(|| config.session.username.clone())
}
