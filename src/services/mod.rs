pub mod harvester;
pub mod paginator;
pub mod serper_client;

pub use harvester::*;
pub use paginator::*;
pub use serper_client::*;
