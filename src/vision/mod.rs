pub(crate) mod cache;
pub(crate) mod compositor;
pub(crate) mod obstruction;
pub(crate) mod range;
pub(crate) mod shadow;
