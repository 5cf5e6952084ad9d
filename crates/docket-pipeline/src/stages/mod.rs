//! Built-in pipeline stages.

pub mod audit;
pub mod conditional;
pub mod create;
pub mod identifier;
pub mod location;
pub mod normalize;
pub mod result;
pub mod update;

pub use audit::AuditStage;
pub use conditional::ConditionalHeaderStage;
pub use create::CreateStage;
pub use identifier::IdentifierStage;
pub use location::LocationStage;
pub use normalize::{normalize_content, NormalizeStage};
pub use result::ResultStage;
pub use update::UpdateStage;
