//! JSON request/response API over the lyric pipeline.

pub mod server;

pub use server::{
    ErrorResponse, GenerateRequest, RespondRequest, SongsmithHttpConfig, SongsmithHttpServer,
};
