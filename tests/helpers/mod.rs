#![allow(dead_code)]

pub mod recording_store;

pub use memory_source::MemoryTermSource;
pub use recording_store::RecordingStore;
pub use scripted_client::{InFlightTerms, Reply, ScriptedSearchClient, SearchCall};
pub use test_harness::{test_config, RedisHarness, SchedulerHarness};
