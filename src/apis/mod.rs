pub mod ieee;
pub mod serpapi;
pub mod springer;
