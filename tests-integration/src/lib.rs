//! Nothing lives here beyond doc glue — the actual end-to-end scenarios are
//! in `tests/`, driving real `echo`/`bash` child processes the way the
//! teacher's own `minion-tests` crate drives real sandboxed children.
