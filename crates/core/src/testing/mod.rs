//! Testing utilities and mock implementations.
//!
//! Provides a mock task dispatcher so the pipeline can be exercised without
//! the real external service. Compiled into the library so the server crate's
//! integration tests can use it too.
//!
//! # Example
//!
//! ```rust,ignore
//! use slateforge_core::testing::MockDispatcher;
//!
//! let dispatcher = MockDispatcher::new();
//! dispatcher.fail_from(2).await; // third submission onward fails
//!
//! // Use in a PipelineOrchestrator...
//! ```

mod mock_dispatcher;

pub use mock_dispatcher::MockDispatcher;
