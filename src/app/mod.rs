// View side: turns orchestrator state into terminal output.

pub mod render;
