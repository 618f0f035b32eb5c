//! CPU operation trait implementations

mod split;
