pub mod preprocessing;
pub mod shapes;
pub mod lines;
pub mod connections;

pub use preprocessing::*;
pub use shapes::*;
pub use lines::*;
pub use connections::*;
