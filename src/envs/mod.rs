pub mod api;
pub mod tabular;

#[cfg(test)]
pub mod fixtures;
