pub mod body;
pub mod clouds;
pub mod planet;
pub mod rings;
