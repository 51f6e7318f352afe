//! Semantic type representation.
//!
//! Classification predicates (`is_integer`, `may_negate`, ...) and the
//! arithmetic promotion rule live here. The cast rules that rewrite
//! expressions are in `sema::cast`.

pub mod types;

#[cfg(test)]
mod tests;
