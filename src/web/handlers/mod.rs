pub mod auth_handlers;
pub mod search_handlers;
pub mod sheet_handlers;
pub mod system_handlers;

pub use auth_handlers::*;
pub use search_handlers::*;
pub use sheet_handlers::*;
pub use system_handlers::*;
