//! HTTP-level integration tests for the NoteGraph server.

mod helpers;

mod graph_test;
mod notes_test;
mod plugins_test;
