pub mod benchmarks;
pub mod himmelblau;

pub use benchmarks::{Booth, Rastrigin, Rosenbrock, Sphere};
pub use himmelblau::Himmelblau;
