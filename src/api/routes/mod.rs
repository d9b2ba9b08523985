pub mod admin;
pub mod analysis;
pub mod leaderboard;
pub mod meta;
pub mod ranks;
pub mod refresh;
