//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types, functions, and macros
//! for easy glob importing:
//!
//! ```ignore
//! use rivet::prelude::*;
//! ```

pub use crate::{
    ClientConfig, Deferred, Error, GeneratedService, HttpClient, HyperClient, Method, Request,
    Response, Result, Rivet, ServiceDeclaration, ServiceInterface, StatusCode, service,
};
pub use serde::{Deserialize, Serialize};
