/// MPD daemon access
pub mod mpd;
/// MPRIS bridge on the session bus
pub mod mpris;
