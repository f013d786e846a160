//! Typed values (xdata) read from group-code tagged streams.
//!
//! A value's kind follows from its group code alone: [`XDataValueType::from_group_code`]
//! maps every code to one kind or to [`XDataValueType::Invalid`]. Decoded values
//! form an [`XDataChain`], a singly linked list kept in stream order.

use std::fmt;

use nalgebra::Vector3;

/// Kind of value that follows a group code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XDataValueType {
    String,
    Point3D,
    Real,
    Int16,
    Int32,
    Int8,
    Binary,
    Handle,
    ObjectId,
    Bool,
    /// No value kind is defined for the code.
    Invalid,
}

impl XDataValueType {
    /// Classify a group code.
    pub fn from_group_code(code: i32) -> Self {
        match code {
            0..=4 | 6..=9 => XDataValueType::String,
            5 => XDataValueType::Handle,
            10..=37 => XDataValueType::Point3D,
            38..=59 => XDataValueType::Real,
            60..=79 => XDataValueType::Int16,
            80..=99 => XDataValueType::Int32,
            100..=102 => XDataValueType::String,
            105 => XDataValueType::Handle,
            110..=149 => XDataValueType::Real,
            170..=179 => XDataValueType::Int16,
            210..=239 => XDataValueType::Real,
            270..=279 => XDataValueType::Int16,
            280..=289 => XDataValueType::Int8,
            290..=299 => XDataValueType::Bool,
            300..=309 => XDataValueType::String,
            310..=319 => XDataValueType::Binary,
            320..=329 => XDataValueType::Handle,
            330..=369 => XDataValueType::ObjectId,
            370..=389 => XDataValueType::Int16,
            390..=399 => XDataValueType::Handle,
            400..=409 => XDataValueType::Int16,
            410..=419 => XDataValueType::String,
            420..=429 => XDataValueType::Int32,
            430..=439 => XDataValueType::String,
            440..=459 => XDataValueType::Int32,
            460..=469 => XDataValueType::Real,
            470..=479 => XDataValueType::String,
            999 => XDataValueType::String,
            1000..=1003 => XDataValueType::String,
            1004 => XDataValueType::Binary,
            1005..=1009 => XDataValueType::String,
            1010..=1059 => XDataValueType::Real,
            1060..=1070 => XDataValueType::Int16,
            1071 => XDataValueType::Int32,
            _ => XDataValueType::Invalid,
        }
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum XDataValue {
    String { text: String, code_page: u8 },
    Point3D(Vector3<f64>),
    Real(f64),
    Int16(i16),
    Int32(i32),
    Int8(u8),
    Binary(Vec<u8>),
    Handle([u8; 8]),
    ObjectId([u8; 8]),
    Bool(bool),
}

impl XDataValue {
    pub fn value_type(&self) -> XDataValueType {
        match self {
            XDataValue::String { .. } => XDataValueType::String,
            XDataValue::Point3D(_) => XDataValueType::Point3D,
            XDataValue::Real(_) => XDataValueType::Real,
            XDataValue::Int16(_) => XDataValueType::Int16,
            XDataValue::Int32(_) => XDataValueType::Int32,
            XDataValue::Int8(_) => XDataValueType::Int8,
            XDataValue::Binary(_) => XDataValueType::Binary,
            XDataValue::Handle(_) => XDataValueType::Handle,
            XDataValue::ObjectId(_) => XDataValueType::ObjectId,
            XDataValue::Bool(_) => XDataValueType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            XDataValue::String { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            XDataValue::Real(v) => Some(*v),
            _ => None,
        }
    }
}

/// Node of an [`XDataChain`].
pub struct XDataNode {
    pub group_code: i16,
    pub value: XDataValue,
    pub next: Option<Box<XDataNode>>,
}

impl fmt::Debug for XDataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XDataNode")
            .field("group_code", &self.group_code)
            .field("value", &self.value)
            .finish()
    }
}

/// Owned, forward-only list of typed values.
#[derive(Default)]
pub struct XDataChain {
    head: Option<Box<XDataNode>>,
    len: usize,
}

impl XDataChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `(group code, value)` pairs in order.
    pub fn from_values(values: Vec<(i16, XDataValue)>) -> Self {
        let len = values.len();
        let head = values
            .into_iter()
            .rev()
            .fold(None, |next, (group_code, value)| {
                Some(Box::new(XDataNode {
                    group_code,
                    value,
                    next,
                }))
            });
        Self { head, len }
    }

    pub fn head(&self) -> Option<&XDataNode> {
        self.head.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl Drop for XDataChain {
    fn drop(&mut self) {
        let mut current = self.head.take();
        while let Some(mut node) = current {
            current = node.next.take();
        }
    }
}

impl Clone for XDataChain {
    fn clone(&self) -> Self {
        Self::from_values(
            self.iter()
                .map(|node| (node.group_code, node.value.clone()))
                .collect(),
        )
    }
}

impl PartialEq for XDataChain {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.group_code == b.group_code && a.value == b.value)
    }
}

impl fmt::Debug for XDataChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the nodes of a chain.
pub struct Iter<'a> {
    next: Option<&'a XDataNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a XDataNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(node)
    }
}

impl<'a> IntoIterator for &'a XDataChain {
    type Item = &'a XDataNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
