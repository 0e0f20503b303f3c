pub mod convert;
pub mod diagnose;
pub mod login;
pub mod playlists;
pub mod session;
pub mod utils;
