pub mod confirmation;
pub mod matcher;
pub mod reporter;
pub mod scheduler;
pub mod store;

pub use confirmation::ConfirmationService;
pub use matcher::{ReconciliationMatcher, ReconciliationReport};
pub use reporter::ManualPaymentReporter;
pub use scheduler::ReminderScheduler;
pub use store::{ClaimPage, PaymentRecordStore};
