pub mod auth;
pub mod avatars;
pub mod calendar;
pub mod entries;
pub mod health;
pub mod insights;
pub mod profile;
