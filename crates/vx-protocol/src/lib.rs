pub mod events;
pub mod intent;
pub mod proposal;
pub mod rule;

pub use events::*;
pub use intent::*;
pub use proposal::*;
pub use rule::*;
