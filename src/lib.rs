pub mod abl;
pub mod data_io;
pub mod error;
pub mod sampling;

pub use error::SamplingError;
pub use sampling::{
    PlaneNormal, ReadOptions, SampleGroup, SamplingReader, SamplingType, VarSelection,
};
