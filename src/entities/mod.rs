pub mod prelude;

pub mod channels;
pub mod playlists;
