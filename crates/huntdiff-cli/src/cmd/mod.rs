pub mod add;
pub mod categorize;
pub mod clear;
pub mod compare;
pub mod completions;
pub mod delete;
pub mod diff;
pub mod list;
pub mod mass_categorize;
pub mod reprocess;
pub mod show;
