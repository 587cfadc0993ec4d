pub mod list;
pub mod sample;
pub mod sorted;

pub use list::{PoolSink, SampleList};
pub use sample::{Admission, SampleRef};
pub use sorted::{ShardedSink, SortedSamples};
