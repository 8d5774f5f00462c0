//! Small reusable data structures that are not specific to presolving, analogous to the
//! grab-bag `basic_types` module that most of this crate's relatives keep around for exactly
//! this purpose.

mod keyed_vec;

pub(crate) use keyed_vec::KeyedVec;
pub(crate) use keyed_vec::StorageKey;
