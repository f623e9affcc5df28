//! Shared test mocks and utilities for the encounter runtime.

mod clock;
mod notifier;
mod reward;
mod rng;
mod store;

pub use clock::{FixedClock, ManualClock};
pub use notifier::RecordingNotifier;
pub use reward::FixedRewardService;
pub use rng::{MockRng, SequenceRng};
pub use store::{FailingQuestStore, MemoryQuestStore, YieldingQuestStore};
