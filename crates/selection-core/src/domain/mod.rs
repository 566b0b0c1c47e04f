//! Domain model (candidates, requests, config, errors).

pub mod candidate;
pub mod config;
pub mod errors;
pub mod request;

pub use candidate::{
    Candidate, CandidateBuilder, Invoker, Operation, OperationTag, ParamType, ReturnType, Signature,
};
pub use config::{ConfigError, DuplicatePolicy, MissingSupportsPolicy, SelectionConfig};
pub use errors::{Capability, HandlerError, SelectionError};
pub use request::{Params, SelectionRequest};
