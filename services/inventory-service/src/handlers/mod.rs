pub mod costs;
pub mod documents;
pub mod health;
pub mod records;

pub use costs::*;
pub use documents::*;
pub use health::*;
pub use records::*;
