pub mod payment;
pub mod rating;

#[cfg(test)]
pub(crate) mod memory;
