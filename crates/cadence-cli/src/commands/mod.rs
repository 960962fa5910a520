pub mod add;
pub mod check;
pub mod delete;
pub mod r#do;
pub mod edit;
pub mod horizon;
pub mod list;
pub mod more;
pub mod preview;
pub mod rules;
pub mod show;
