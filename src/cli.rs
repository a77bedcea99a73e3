use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "singscore")]
#[command(about = "Score sung performances against a reference melody")]
pub struct Cli {
    /// Show debug logging (overridden by SINGSCORE_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score a recorded performance and save it to the history
    Score {
        /// The singer's recording (WAV)
        performance: PathBuf,

        /// Reference melody: a WAV recording or a JSON contour
        #[arg(long, short)]
        reference: PathBuf,

        /// Song identifier for the history (defaults to the reference file name)
        #[arg(long)]
        song_id: Option<String>,

        /// Song title for the history (defaults to the song id)
        #[arg(long)]
        title: Option<String>,

        /// Singer name (defaults to session.username from the config)
        #[arg(long)]
        user: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Don't record the result in the history
        #[arg(long)]
        no_save: bool,
    },

    /// Print only the quick mean-error score
    Quick {
        /// The singer's recording (WAV or JSON contour)
        performance: PathBuf,

        /// Reference melody: a WAV recording or a JSON contour
        #[arg(long, short)]
        reference: PathBuf,
    },

    /// Detect the pitch contour of a WAV file and write it as JSON
    Extract {
        /// Input recording
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Resample a contour onto the time grid of another
    Align {
        /// Contour to resample (WAV or JSON)
        source: PathBuf,

        /// Contour whose time grid is used (WAV or JSON)
        #[arg(long)]
        grid: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List recorded sessions
    Sessions {
        /// Only this singer's sessions
        #[arg(long)]
        user: Option<String>,
    },

    /// Show every result in one session
    Session {
        /// Session key, e.g. singer_20260301
        key: String,
    },

    /// Lifetime statistics for a singer
    Stats {
        #[arg(long)]
        user: Option<String>,
    },

    /// A singer's best songs
    Top {
        #[arg(long)]
        user: Option<String>,

        /// How many songs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show where data and config files are stored
    Paths,
}
