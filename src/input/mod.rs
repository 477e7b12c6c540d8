pub mod manager;
pub mod source;
pub mod target;

#[cfg(test)]
mod manager_test;
