//! Execution of GraphQL operations against caller-provided resolvers.
//!
//! The entry point is [`Execution`]: it takes a validated schema and
//! executable document (from [`apollo_compiler`]), coerces variable values,
//! and drives resolvers implementing the [`Resolver`] trait to produce a
//! [`Response`]. Subscription operations are started with
//! [`Execution::source_event_stream`] instead.

#![cfg_attr(feature = "failfast", allow(unreachable_code))]

macro_rules! failfast_debug {
    ($($tokens:tt)+) => {{
        tracing::debug!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

macro_rules! failfast_error {
    ($($tokens:tt)+) => {{
        tracing::error!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

mod engine;
mod input_coercion;
mod path;
mod request;
mod resolver;
mod response;
mod result_coercion;
mod subscription;
mod validation;

pub use apollo_compiler::response::GraphQLError;
pub use apollo_compiler::response::JsonMap;
pub use apollo_compiler::response::JsonValue;

pub use crate::request::*;
pub use crate::resolver::*;
pub use crate::response::*;
pub use crate::subscription::*;
pub use crate::validation::SUSPECTED_VALIDATION_BUG;
