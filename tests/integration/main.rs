//! Integration tests: the acquisition and generation pipeline driven
//! end to end against in-memory sources.

mod mock_source;
mod pipeline;
