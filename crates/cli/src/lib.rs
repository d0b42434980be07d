//! Command-line front end for the flowtimer scheduling core.

pub mod cli;
