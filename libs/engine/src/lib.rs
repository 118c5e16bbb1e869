pub mod args;
pub mod checkpoint;
pub mod gap;
pub mod job;
pub mod listener;
pub mod signal;
pub mod syncer;
pub mod nft {
    pub mod decode;
    pub mod dictionary;
    pub mod drain;
    pub mod resolver;
}
