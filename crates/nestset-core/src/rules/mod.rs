pub mod invariants;
pub mod validation;

pub use validation::check_invariants;
