pub mod network;
pub mod table;
pub mod variable;
