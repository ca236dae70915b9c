// src/constants.rs

use std::time::Duration;

/// Application name shown on desktop notifications
pub const APP_NAME: &str = "Spotify Auto Mute";

/// Display name of the application whose audio is toggled
pub const CONTROLLED_APP_NAME: &str = "Spotify";

/// Display name of the trigger, used in notification text
pub const TRIGGER_NAME: &str = "YouTube";

/// Window title patterns that mark the trigger as focused (case-insensitive)
pub const TRIGGER_TITLES: &[&str] = &[
    "youtube",
    "youtube - google chrome",
    "youtube music",
    "chrome - youtube",
    "youtube - microsoft edge",
    "youtube - firefox",
    "youtube - opera",
    "youtube.com",
    "music.youtube.com",
];

/// Domain tokens that mark the trigger regardless of the title list
pub const TRIGGER_DOMAINS: &[&str] = &["youtube.com", "youtu.be"];

/// Process names of the controlled application (case-insensitive)
pub const TARGET_PROCESS_NAMES: &[&str] = &["spotify", "spotify.exe", "spotifywebhelper.exe"];

/// Delay between two poll ticks
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long a resolved audio session handle may be reused by read-only probes
pub const SESSION_CACHE_TTL: Duration = Duration::from_secs(5);

/// Minimum time between two delivered notifications
pub const NOTIFICATION_COOLDOWN: Duration = Duration::from_secs(10);

/// How long a notification stays on screen
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Consecutive failing ticks after which the poll loop gives up
pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Upper bound on a single audio backend command
pub const AUDIO_COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on the final unmute during shutdown
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(3);

/// File name of the append-only log inside the data directory
pub const LOG_FILE_NAME: &str = "tubemute.log";
