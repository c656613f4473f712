pub(crate) mod action;
pub(crate) mod meta;
