// apps/sg_cli/src/commands/mod.rs

//! 子命令实现

pub mod gradient;
pub mod info;
pub mod validate;
