pub mod claim;
pub mod reminder;

pub use claim::{BankTransaction, ClaimStatus, PaymentClaim, PaymentMethod};
pub use reminder::ReminderTask;
