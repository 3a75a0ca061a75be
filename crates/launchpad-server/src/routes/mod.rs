pub mod chats;
pub mod crew;
pub mod enhance;
pub mod forms;
pub mod health;
pub mod investor;
pub mod pitcher;
pub mod predict;
pub mod rag;
