mod channel;
mod check;
mod import;
mod playlist;
mod summary;

pub use channel::{cmd_channel_add, cmd_channel_list, cmd_channel_remove};
pub use check::cmd_check_playlist;
pub use import::{cmd_import_m3u, cmd_refresh_playlist};
pub use playlist::{
    cmd_playlist_add, cmd_playlist_list, cmd_playlist_remove, cmd_playlist_toggle,
};
pub use summary::cmd_summary;
