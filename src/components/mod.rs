pub mod colors;
pub mod dialogs;
pub mod history;
pub mod tools;
