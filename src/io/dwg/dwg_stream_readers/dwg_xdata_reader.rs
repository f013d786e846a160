use nalgebra::Vector3;
use tracing::trace;

use crate::error::{DwgError, Result};
use crate::notification::NotificationCollection;
use crate::types::CodePage;
use crate::xdata::{XDataChain, XDataValue, XDataValueType};

use super::idwg_stream_reader::DwgStreamReader;

/// Reads group-code tagged value chains (XRECORD data, xdata).
pub struct DwgXDataReader;

impl DwgXDataReader {
    /// Read values from the next `size` bytes.
    ///
    /// Stops at the first unclassifiable group code or failed read: the error
    /// is recorded, the cursor is moved to the end of the span and the values
    /// read so far are returned.
    pub fn read(
        reader: &mut dyn DwgStreamReader,
        size: u64,
        notifications: &mut NotificationCollection,
    ) -> XDataChain {
        let end = reader.position_in_bits().saturating_add(size.saturating_mul(8));
        let mut values = Vec::new();

        while reader.position_in_bits() < end {
            let offset = reader.position();
            match Self::read_value(reader, offset) {
                Ok((code, value)) => {
                    trace!(code, kind = ?value.value_type(), "xdata value");
                    values.push((code, value));
                }
                Err(error) => {
                    notifications.notify_error(&error);
                    reader.set_position_in_bits(end);
                    break;
                }
            }
        }

        XDataChain::from_values(values)
    }

    fn read_value(reader: &mut dyn DwgStreamReader, offset: u64) -> Result<(i16, XDataValue)> {
        let code = reader.read_raw_short()?;
        let value = match XDataValueType::from_group_code(code as i32) {
            XDataValueType::String => {
                let length = reader.read_raw_short()? as u16;
                let code_page = reader.read_raw_char()?;
                let bytes = reader.read_bytes(length as usize)?;
                XDataValue::String {
                    text: CodePage(code_page as u16).decode(&bytes),
                    code_page,
                }
            }
            XDataValueType::Real => XDataValue::Real(reader.read_double()?),
            XDataValueType::Int8 => XDataValue::Int8(reader.read_raw_char()?),
            XDataValueType::Bool => XDataValue::Bool(reader.read_raw_char()? != 0),
            XDataValueType::Int16 => XDataValue::Int16(reader.read_raw_short()?),
            XDataValueType::Int32 => XDataValue::Int32(reader.read_raw_long()? as i32),
            XDataValueType::Point3D => XDataValue::Point3D(Vector3::new(
                reader.read_double()?,
                reader.read_double()?,
                reader.read_double()?,
            )),
            XDataValueType::Binary => {
                let length = reader.read_raw_char()?;
                XDataValue::Binary(reader.read_bytes(length as usize)?)
            }
            XDataValueType::Handle => XDataValue::Handle(Self::read_raw_handle(reader)?),
            XDataValueType::ObjectId => XDataValue::ObjectId(Self::read_raw_handle(reader)?),
            XDataValueType::Invalid => {
                return Err(DwgError::UnclassifiableGroupCode { code, offset });
            }
        };
        Ok((code, value))
    }

    fn read_raw_handle(reader: &mut dyn DwgStreamReader) -> Result<[u8; 8]> {
        let bytes = reader.read_bytes(8)?;
        let mut handle = [0u8; 8];
        handle.copy_from_slice(&bytes);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::dwg_stream_readers::DwgStreamReaderBase;
    use crate::notification::NotificationType;
    use crate::types::DwgVersion;

    fn string(code: i16, text: &str) -> Vec<u8> {
        let mut out = code.to_le_bytes().to_vec();
        out.extend_from_slice(&(text.len() as u16).to_le_bytes());
        out.push(30);
        out.extend_from_slice(text.as_bytes());
        out
    }

    fn real(code: i16, value: f64) -> Vec<u8> {
        let mut out = code.to_le_bytes().to_vec();
        out.extend_from_slice(&value.to_le_bytes());
        out
    }

    fn read(data: Vec<u8>) -> (XDataChain, NotificationCollection, DwgStreamReaderBase) {
        let size = data.len() as u64;
        let mut reader = DwgStreamReaderBase::new(data, DwgVersion::AC1015);
        let mut notes = NotificationCollection::new();
        let chain = DwgXDataReader::read(&mut reader, size, &mut notes);
        (chain, notes, reader)
    }

    #[test]
    fn test_string_then_real() {
        let mut data = string(1, "FOO");
        data.extend(real(40, 1.5));
        let (chain, notes, _) = read(data);

        assert!(notes.is_empty());
        assert_eq!(chain.len(), 2);
        let values: Vec<_> = chain.iter().collect();
        assert_eq!(values[0].group_code, 1);
        assert_eq!(values[0].value.as_str(), Some("FOO"));
        assert_eq!(values[1].group_code, 40);
        assert_eq!(values[1].value.as_f64(), Some(1.5));
        assert!(values[1].next.is_none());
    }

    #[test]
    fn test_all_kinds() {
        let mut data = Vec::new();
        data.extend(10i16.to_le_bytes());
        for v in [1.0f64, 2.0, 3.0] {
            data.extend(v.to_le_bytes());
        }
        data.extend(70i16.to_le_bytes());
        data.extend((-2i16).to_le_bytes());
        data.extend(90i16.to_le_bytes());
        data.extend(100_000i32.to_le_bytes());
        data.extend(280i16.to_le_bytes());
        data.push(7);
        data.extend(290i16.to_le_bytes());
        data.push(1);
        data.extend(310i16.to_le_bytes());
        data.extend([2, 0xAB, 0xCD]);
        data.extend(330i16.to_le_bytes());
        data.extend([0, 0, 0, 0, 0, 0, 0, 0x1F]);
        data.extend(5i16.to_le_bytes());
        data.extend([1, 2, 3, 4, 5, 6, 7, 8]);

        let (chain, notes, reader) = read(data);
        assert!(notes.is_empty());
        let kinds: Vec<_> = chain.iter().map(|n| n.value.value_type()).collect();
        assert_eq!(
            kinds,
            vec![
                XDataValueType::Point3D,
                XDataValueType::Int16,
                XDataValueType::Int32,
                XDataValueType::Int8,
                XDataValueType::Bool,
                XDataValueType::Binary,
                XDataValueType::ObjectId,
                XDataValueType::Handle,
            ]
        );
        let values: Vec<_> = chain.iter().map(|n| n.value.clone()).collect();
        assert_eq!(values[0], XDataValue::Point3D(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(values[1], XDataValue::Int16(-2));
        assert_eq!(values[2], XDataValue::Int32(100_000));
        assert_eq!(values[5], XDataValue::Binary(vec![0xAB, 0xCD]));
        assert_eq!(reader.position(), reader.length());
    }

    #[test]
    fn test_invalid_code_returns_partial_chain() {
        let mut data = string(1, "A");
        data.extend(real(40, 2.0));
        data.extend(200i16.to_le_bytes());
        data.extend([0xFF; 10]);
        let total = data.len() as u64;

        let (chain, notes, reader) = read(data);
        assert_eq!(chain.len(), 2);
        assert_eq!(notes.of_type(NotificationType::Warning).count(), 1);
        assert!(notes.contains("200"));
        assert_eq!(reader.position(), total);
    }

    #[test]
    fn test_truncated_value_ends_chain() {
        let mut data = string(1, "OK");
        data.extend(40i16.to_le_bytes());
        data.extend([0, 0, 0]);
        let (chain, notes, _) = read(data);
        assert_eq!(chain.len(), 1);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_empty_span() {
        let (chain, notes, _) = read(Vec::new());
        assert!(chain.is_empty());
        assert!(notes.is_empty());
    }
}
