pub mod authority;
pub mod entity;
pub mod forms;
pub mod init;
pub mod language;
pub mod lookup;
pub mod name;
pub mod reindex;
pub mod script;
