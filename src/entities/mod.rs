//! Entity module - Contains all SeaORM entity definitions for the ledger tables.
//! Each entity has a Model struct for data and an Entity struct for operations.
//! Enumerated columns are stored with the same string values they carry on the wire.

pub mod collector;
pub mod customer;
pub mod deposit;
pub mod feedback;
pub mod plan;
pub mod withdrawal_request;

// Re-export specific types to avoid conflicts
pub use collector::{Column as CollectorColumn, Entity as Collector, Model as CollectorModel};
pub use customer::{
    AccountStatus, AccountType, Column as CustomerColumn, Entity as Customer,
    Model as CustomerModel,
};
pub use deposit::{
    Column as DepositColumn, DepositStatus, DepositType, Entity as Deposit,
    Model as DepositModel, PaymentMethod,
};
pub use feedback::{
    Column as FeedbackColumn, Entity as Feedback, FeedbackSource, FeedbackStatus,
    Model as FeedbackModel,
};
pub use plan::{Column as PlanColumn, DepositFrequency, Entity as Plan, Model as PlanModel};
pub use withdrawal_request::{
    Column as WithdrawalRequestColumn, Entity as WithdrawalRequest, HandlerRole,
    Model as WithdrawalRequestModel, WithdrawalStatus,
};
