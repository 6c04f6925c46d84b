mod discord;
mod slack;

pub use discord::DiscordRestApi;
pub use slack::SlackWebApi;
