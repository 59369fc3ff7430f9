pub mod error;
pub mod io;
pub mod matching;
pub mod models;
pub mod utils;
