//! CUDA operation trait implementations

mod split;
