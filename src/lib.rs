//! A rust library for in-memory hierarchical scientific data: groups, dimensions, attributes, and variables.
//!
//! The data model follows the common scientific data conventions of NetCDF and the CDM.
//! Client code builds a tree of named objects in a [`Hierarchy`], attaches typed attribute metadata,
//! allocates and writes variable data incrementally along an unlimited leading dimension,
//! and copies subtrees between hierarchies while converting data types and physical units.
//!
//! ## Getting Started
//! - [`Hierarchy`] owns every object and is the entry point for defining, looking up, and deleting them.
//! - [`DataType`], [`Value`], and [`DataArray`] are the closed set of element types and their scalar and vector values.
//! - [`converter::Converter`] converts values between data types and units, mapping missing values and clamping ranges.
//! - [`copy`] copies groups, dimensions, attributes, and variables between hierarchies.
//! - The `time`, `time_offset`, and `base_time` variables hold sample times, see [`Hierarchy::set_sample_times`].
//!
//! ## Example
//! ```rust
//! # use cds::{converter::Converter, DataArray, DataType, Hierarchy, Value};
//! let mut hierarchy = Hierarchy::new();
//! let root = hierarchy.define_group(None, "radar")?;
//! hierarchy.define_dim(root, "time", 0, true)?;
//! hierarchy.define_dim(root, "range", 3, false)?;
//! let dbz = hierarchy.define_var(root, "dbz", DataType::Short, &["time", "range"])?;
//! hierarchy.define_att(dbz.into(), "missing_value", DataArray::from(vec![-32768i16]))?;
//! hierarchy.define_att_text(dbz.into(), "units", "dBZ")?;
//!
//! // write two samples, mapping the caller's missing value to the variable's
//! let samples = DataArray::from(vec![10.4f32, -1.0, 12.6, 0.0, 1.5, 2.5]);
//! hierarchy.set_var_data(dbz, &samples, 0, Some(&DataArray::from(vec![-1.0f32])))?;
//! assert_eq!(
//!     hierarchy.var_data(dbz),
//!     Some(&DataArray::Short(vec![10, -32768, 13, 0, 2, 3]))
//! );
//!
//! // widen the variable, keeping the missing value
//! hierarchy.change_var_type(dbz, DataType::Float)?;
//! assert_eq!(hierarchy.get_var_missing_values(dbz)?, DataArray::Float(vec![-32768.0]));
//! # Ok::<(), cds::CdsError>(())
//! ```
//!
//! ## Errors and Logging
//! Fallible operations return a [`CdsError`].
//! Operations that a definition lock may intentionally skip return an [`Outcome`].
//! Events are emitted through [`tracing`] with the `cds` target.
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: [`ndarray`] views of variable data.
//!
//! ## Licence
//! `cds` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
// #![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod converter;
pub mod copy;
pub mod data_type;
mod error;
pub mod hierarchy;
pub mod node;
pub mod units;

pub(crate) use error::COMPONENT;
pub use error::{CdsError, ErrorKind, Outcome};

pub use data_type::{DataArray, DataType, Element, Value};
pub use hierarchy::{
    Attribute, DataIndex, Dimension, Group, Hierarchy, RetrievedData, TimeRange, TimeVar, VarArray,
    VarGroup, Variable,
};
pub use node::{
    AttId, AttParent, DimId, GroupId, ObjectId, ObjectKind, VarArrayId, VarGroupId, VarId,
};
