pub mod constants;
#[cfg(test)]
pub mod test_helpers;
pub mod thai;
pub mod types;
pub mod validation;
