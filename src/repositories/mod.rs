pub(crate) mod classifications;
