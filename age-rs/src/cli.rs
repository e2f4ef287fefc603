//! Root CLI structure for age-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "age-rs")]
#[command(about = "Command-line tools for Angel Game Engine asset formats", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// TEX texture operations
    Tex {
        #[command(subcommand)]
        command: crate::commands::tex::TexCommands,
    },

    /// MOD skinned model operations
    Mod {
        #[command(subcommand)]
        command: crate::commands::model::ModCommands,
    },

    /// BMS static mesh operations
    Bms {
        #[command(subcommand)]
        command: crate::commands::bms::BmsCommands,
    },

    /// BND/BBND collision bound and TER terrain operations
    Bnd {
        #[command(subcommand)]
        command: crate::commands::bnd::BndCommands,
    },

    /// SKEL skeleton operations
    Skel {
        #[command(subcommand)]
        command: crate::commands::skel::SkelCommands,
    },

    /// DLP7 patch mesh operations
    Dlp {
        #[command(subcommand)]
        command: crate::commands::dlp::DlpCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
