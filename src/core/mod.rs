pub mod dispatcher;
pub mod rate_budget;
pub mod scheduler;
pub mod term_queue;
pub mod types;
pub mod worker;

pub use dispatcher::{DispatchOutcome, SearchDispatcher};
pub use rate_budget::RateBudget;
pub use scheduler::SearchScheduler;
pub use term_queue::TermQueue;
pub use types::*;
pub use worker::{AccountWorker, CycleOutcome, WorkerExit};
