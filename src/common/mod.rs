pub mod client {
    pub mod client;
}

pub mod console;
pub mod logger;
pub mod utils;
