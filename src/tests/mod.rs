//! Cross-module tests on synthetic files.

mod continental;
