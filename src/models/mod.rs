// src/models/mod.rs

pub mod comment;
pub mod reply_log;
pub mod user;
pub mod video;
