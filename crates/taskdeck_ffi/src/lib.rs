//! Flutter bridge surface for the TaskDeck core.

pub mod api;
