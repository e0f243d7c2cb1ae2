//! The instrument-independent container handed to QC, plotting and export.
//!
//! Dimensions and variables are typed arrays. A variable's shape is checked
//! against the dimensions it names when it's added to a [`SampleDataSet`], so
//! a data set can never hold a variable that doesn't fit its dimensions.

pub mod params;

use std::collections::HashMap;

use hifitime::Duration;
use ndarray::{ArrayD, Ix1};
use thiserror::Error;

pub use params::{parameter, Parameter, PARAMETERS};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("dimension {name} must be one-dimensional, got {ndim} dimensions")]
    NotOneDimensional { name: String, ndim: usize },

    #[error("{0} is already defined in this data set")]
    Duplicate(String),

    #[error("variable {variable} references unknown dimension {dimension}")]
    UnknownDimension { variable: String, dimension: String },

    #[error("variable {variable} has shape {found:?} but its dimensions give {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Int8,
    Int16,
    Int32,
    Float32,
    Float64,
}

/// An n-dimensional array tagged with its storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

macro_rules! dispatch {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            TypedArray::Int8($a) => $body,
            TypedArray::Int16($a) => $body,
            TypedArray::Int32($a) => $body,
            TypedArray::Float32($a) => $body,
            TypedArray::Float64($a) => $body,
        }
    };
}

impl TypedArray {
    /// Store `values` as `storage`. Float to int casts saturate and map NaN
    /// to 0, as `as` does.
    pub fn from_f64(storage: StorageType, values: ArrayD<f64>) -> TypedArray {
        match storage {
            StorageType::Int8 => TypedArray::Int8(values.mapv(|v| v as i8)),
            StorageType::Int16 => TypedArray::Int16(values.mapv(|v| v as i16)),
            StorageType::Int32 => TypedArray::Int32(values.mapv(|v| v as i32)),
            StorageType::Float32 => TypedArray::Float32(values.mapv(|v| v as f32)),
            StorageType::Float64 => TypedArray::Float64(values),
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            TypedArray::Int8(_) => StorageType::Int8,
            TypedArray::Int16(_) => StorageType::Int16,
            TypedArray::Int32(_) => StorageType::Int32,
            TypedArray::Float32(_) => StorageType::Float32,
            TypedArray::Float64(_) => StorageType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        dispatch!(self, a => a.ndim())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A widened copy, for collaborators that don't care about storage.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            TypedArray::Int8(a) => a.mapv(f64::from),
            TypedArray::Int16(a) => a.mapv(f64::from),
            TypedArray::Int32(a) => a.mapv(f64::from),
            TypedArray::Float32(a) => a.mapv(f64::from),
            TypedArray::Float64(a) => a.clone(),
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            TypedArray::Float32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            TypedArray::Float64(a) => Some(a),
            _ => None,
        }
    }
}

/// A named coordinate axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    data: TypedArray,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub comment: Option<String>,
}

impl Dimension {
    pub fn new<S: Into<String>>(name: S, data: TypedArray) -> Result<Dimension, ModelError> {
        let name = name.into();
        if data.ndim() != 1 {
            return Err(ModelError::NotOneDimensional {
                name,
                ndim: data.ndim(),
            });
        }
        Ok(Dimension {
            name,
            data,
            long_name: None,
            units: None,
            comment: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &TypedArray {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn storage_type(&self) -> StorageType {
        self.data.storage_type()
    }

    /// The coordinate values, widened to `f64`.
    pub fn values(&self) -> ndarray::Array1<f64> {
        self.data
            .to_f64()
            .into_dimensionality::<Ix1>()
            .unwrap_or_else(|_| unreachable!("checked in Dimension::new"))
    }
}

/// A named physical quantity laid out over a list of dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dimensions: Vec<String>,
    data: TypedArray,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub comment: Option<String>,
}

impl Variable {
    pub fn new<S: Into<String>>(name: S, dimensions: &[&str], data: TypedArray) -> Variable {
        Variable {
            name: name.into(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            data,
            long_name: None,
            units: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension names, outermost first.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn data(&self) -> &TypedArray {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn storage_type(&self) -> StorageType {
        self.data.storage_type()
    }
}

/// Instrument and file metadata carried alongside the arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub instrument_make: String,
    pub instrument_model: String,
    pub instrument_serial_no: String,
    pub instrument_firmware: String,

    /// The median spacing of consecutive ensembles. `None` if there is only
    /// one ensemble.
    pub instrument_sample_interval: Option<Duration>,

    /// \[degrees\]
    pub beam_angle: f64,

    /// Vertical cell size \[metres\].
    pub bin_size: f64,

    pub feature_type: String,
    pub coordinate_system: String,

    /// The file name (no directories) of the decoded file.
    pub original_file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleDataSet {
    pub meta: Metadata,
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
    dimension_index: HashMap<String, usize>,
    variable_index: HashMap<String, usize>,
}

impl SampleDataSet {
    pub fn new(meta: Metadata) -> SampleDataSet {
        SampleDataSet {
            meta,
            dimensions: vec![],
            variables: vec![],
            dimension_index: HashMap::new(),
            variable_index: HashMap::new(),
        }
    }

    /// Names are shared between dimensions and variables.
    fn check_name_is_free(&self, name: &str) -> Result<(), ModelError> {
        if self.dimension_index.contains_key(name) || self.variable_index.contains_key(name) {
            Err(ModelError::Duplicate(name.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn add_dimension(&mut self, dimension: Dimension) -> Result<(), ModelError> {
        self.check_name_is_free(dimension.name())?;
        self.dimension_index
            .insert(dimension.name().to_string(), self.dimensions.len());
        self.dimensions.push(dimension);
        Ok(())
    }

    /// Add a variable, checking every dimension it names exists and that its
    /// shape is the product of those dimensions, in order.
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), ModelError> {
        self.check_name_is_free(variable.name())?;
        let expected = variable
            .dimensions()
            .iter()
            .map(|d| {
                self.dimension(d)
                    .map(Dimension::len)
                    .ok_or_else(|| ModelError::UnknownDimension {
                        variable: variable.name().to_string(),
                        dimension: d.clone(),
                    })
            })
            .collect::<Result<Vec<usize>, _>>()?;
        if variable.shape() != expected.as_slice() {
            return Err(ModelError::ShapeMismatch {
                variable: variable.name().to_string(),
                expected,
                found: variable.shape().to_vec(),
            });
        }

        self.variable_index
            .insert(variable.name().to_string(), self.variables.len());
        self.variables.push(variable);
        Ok(())
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimension_index.get(name).map(|&i| &self.dimensions[i])
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variable_index.get(name).map(|&i| &self.variables[i])
    }

    /// Dimensions in the order they were added.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Variables in the order they were added.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}
