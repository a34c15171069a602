pub(crate) mod chat;
pub(crate) mod classifier;
pub(crate) mod dashboard;
pub(crate) mod insight;
pub(crate) mod interpreter;
pub(crate) mod json_extract;
pub(crate) mod performance;
