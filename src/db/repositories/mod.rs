pub mod channel;
pub mod playlist;

pub use channel::ChannelRepository;
pub use playlist::PlaylistRepository;
