pub(crate) mod context;
pub(crate) mod input;
pub(crate) mod pass;
pub(crate) mod scheduler;
pub(crate) mod stats;
