//! Application services for task orchestration.

mod controller;

pub use controller::{CreateTaskRequest, TaskService, TaskServiceError, TaskServiceResult};
