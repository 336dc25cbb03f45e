/*
[INPUT]:  Subcommands other than the chart run
[OUTPUT]: CLI helpers used by main.rs
[POS]:    CLI module root
[UPDATE]: When adding subcommands
*/

pub mod init;
