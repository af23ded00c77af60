pub mod media;
pub mod model;
pub mod time_ago;
pub mod util;
