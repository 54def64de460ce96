//! A chunked, compressed, N-dimensional array storage engine.
//!
//! Arrays are split into a regular grid of fixed-shape chunks. Each chunk is
//! compressed as a whole and stored as the value of one key in a
//! byte-addressable key-value store. [`array::Array`] and [`storage`] are good
//! places to start.
//!
//! ## Example
//! ```
//! # use std::sync::Arc;
//! use ndstore::array::{ArrayBuilder, DataType, FillValue};
//! use ndstore::array_subset::ArraySubset;
//! use ndstore::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! futures::executor::block_on(async {
//!     let store = Arc::new(MemoryStore::new());
//!     let array = ArrayBuilder::new(vec![8, 8], DataType::Float32, vec![4, 4])
//!         .fill_value(FillValue::from(0.0f32))
//!         .build(store, "array")?;
//!
//!     array
//!         .store_array_subset_elements::<f32>(
//!             &ArraySubset::new_with_ranges(&[2..6, 2..6]),
//!             vec![1.0; 16],
//!         )
//!         .await?;
//!
//!     let all = array
//!         .retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_shape(vec![8, 8]))
//!         .await?;
//!     assert_eq!(all.iter().filter(|&&element| element == 1.0).count(), 16);
//!     Ok(())
//! })
//! # }
//! ```

#![warn(unused_variables)]
#![warn(dead_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod storage;
