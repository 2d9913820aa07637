// src/models/mod.rs

pub mod application;
pub mod assessment;
pub mod attempt;
pub mod job;
pub mod profile;
pub mod question;
pub mod skill;
pub mod user;
