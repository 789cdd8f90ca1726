// Library exports for testing
// The binary (main.rs) imports these as well

pub mod env;
pub mod error;
pub mod logger;
pub mod paths;
pub mod shutdown;

#[cfg(test)]
mod tests;
