pub use super::channels::Entity as Channels;
pub use super::playlists::Entity as Playlists;
