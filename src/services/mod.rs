// src/services/mod.rs

pub mod ai;
pub mod classifier;
pub mod oauth;
pub mod replies;
pub mod videos;
pub mod youtube;
