pub(crate) mod color;
pub(crate) mod store;
pub(crate) mod synth;
