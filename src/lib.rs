pub mod config;
pub mod crawler;
pub mod directory;
pub mod drive;
pub mod storage;
