//! Client side of the task board: API wrapper and presentation state.

pub mod board;
pub mod client;

pub use board::{TaskBoard, ViewFilter};
pub use client::{
    default_api_base, ClientError, CreateTaskInput, ListOptions, TaskApi, TaskClient,
    UpdateTaskInput,
};
