// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderId, LineItem, Order)
// - Commands (OrderPayload, IngestMode) and their validation
// - Events (NotificationEvent)
// - Errors (ValidationError, IngestError)
// - Command handler (OrderCommandHandler - the ingestion pipeline)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use command_handler::*;
