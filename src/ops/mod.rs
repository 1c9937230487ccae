pub mod ai;
pub mod color_removal;
