//! End-to-end tests driving `pbforge build` against a fake Go toolchain.

#[cfg(unix)]
mod common;

#[cfg(unix)]
mod build_tests;
