////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! An OpenGL bindings generator for the Beef programming language. It parses the Khronos
//! `gl.xml` registry and writes a `GL` class containing all constants and function
//! pointers of a given OpenGL version and profile.
//!
//! # Example
//!
//! ```no_run
//! extern crate beef_generator;
//!
//! use beef_generator::{GlobalGenerator, Profile, Registry};
//! use std::fs::{self, File};
//! use std::io::BufReader;
//!
//! fn main() {
//!     let file = File::open("gl.xml").unwrap();
//!     let registry = Registry::parse(BufReader::new(file)).unwrap();
//!
//!     let mut bindings = Vec::new();
//!     registry
//!         .full_version("3.3", Profile::Core)
//!         .unwrap()
//!         .write_bindings(GlobalGenerator::new("opengl"), &mut bindings)
//!         .unwrap();
//!
//!     fs::write("GL.bf", bindings).unwrap();
//! }
//! ```
//!
//! The registry is parsed once into an immutable [`Registry`] value; any number of
//! [`full_version`](Registry::full_version) compositions can then run against it.

extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate thiserror;
extern crate xml;

#[cfg(feature = "unstable_generator_utils")]
pub mod generators;
#[cfg(not(feature = "unstable_generator_utils"))]
mod generators;

mod registry;

pub use generators::{global_gen::GlobalGenerator, Generator};

pub use registry::*;
