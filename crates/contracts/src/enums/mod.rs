pub mod commission_type;
pub mod deletion;
pub mod feature_key;
pub mod payment;
pub mod user_role;

pub use commission_type::CommissionType;
pub use deletion::{DeletionStatus, DeletionTarget};
pub use feature_key::FeatureKey;
pub use payment::{PaymentMethod, PaymentStatus};
pub use user_role::UserRole;
