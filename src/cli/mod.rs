//! CLI module - Command-line interface for Chanarr
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chanarr - IPTV channel and playlist catalog
#[derive(Parser)]
#[command(name = "chanarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Create default config file
    Init,

    /// Manage playlists
    #[command(alias = "pl")]
    Playlist {
        #[command(subcommand)]
        command: PlaylistCommands,
    },

    /// Manage channels
    #[command(alias = "ch")]
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },

    /// Import an M3U file into a playlist
    Import {
        /// Playlist ID
        playlist: String,
        /// Path to the .m3u/.m3u8 file
        file: PathBuf,
    },

    /// Re-download a playlist from its source url and import new channels
    Refresh {
        /// Playlist ID
        playlist: String,
    },

    /// Probe every channel of a playlist and record the results
    Check {
        /// Playlist ID
        playlist: String,
        /// Name recorded as the checker
        #[arg(long, default_value = "cli")]
        actor: String,
    },

    /// Show catalog totals
    Summary,
}

#[derive(Subcommand)]
pub enum PlaylistCommands {
    /// List all playlists
    #[command(alias = "ls")]
    List,
    /// Create a playlist
    Add {
        /// Playlist name
        name: String,
        /// Remote M3U source
        #[arg(long)]
        url: Option<String>,
        /// Create the playlist disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Delete a playlist (member channels follow the configured policy)
    #[command(alias = "rm")]
    Remove {
        /// Playlist ID
        id: String,
    },
    /// Enable or disable a playlist
    Toggle {
        /// Playlist ID
        id: String,
        /// New state
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
pub enum ChannelCommands {
    /// List channels
    #[command(alias = "ls")]
    List {
        /// Only channels of this playlist
        #[arg(long)]
        playlist: Option<String>,
        /// Only channels with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Create a channel
    Add {
        /// Channel name
        name: String,
        /// Stream url
        url: String,
        /// Playlist ID to add it to
        #[arg(long)]
        playlist: Option<String>,
    },
    /// Delete a channel
    #[command(alias = "rm")]
    Remove {
        /// Channel ID
        id: String,
    },
}

pub use commands::*;
