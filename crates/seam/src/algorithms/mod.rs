pub mod selection;
pub mod skeleton;
pub mod points;
pub mod fitting;
pub mod projection;

pub use selection::*;
pub use skeleton::*;
pub use points::*;
pub use fitting::*;
pub use projection::*;
