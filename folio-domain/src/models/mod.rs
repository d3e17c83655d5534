/// Domain entities
///
/// Each entity wraps one backend row: field names map to column names via
/// serde, identity is the row's primary key, and mutation methods keep the
/// entity's own invariants (non-empty names, status/completed coupling
/// helpers). Business rules that span entities live in the services.

pub mod address;
pub mod portfolio;
pub mod profile;
pub mod task;
pub mod task_image;

pub use address::{AddressInput, AddressKind, ProfileAddress};
pub use portfolio::Portfolio;
pub use profile::{Profile, SubscriptionPlan};
pub use task::{Task, TaskLabel, TaskPriority, TaskStatus};
pub use task_image::TaskImage;
