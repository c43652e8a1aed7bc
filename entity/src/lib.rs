//! sea-orm entities backing the SQL document store.

pub mod documents;
