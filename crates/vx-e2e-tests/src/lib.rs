//! End-to-end tests for the Voxa workspace live under `tests/`.
