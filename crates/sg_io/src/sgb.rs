// crates/sg_io/src/sgb.rs

//! SGB 二进制格式
//!
//! 按字段随机访问的二进制容器，表面与顶点场共用。
//!
//! # 格式结构
//!
//! ```text
//! +----------------+
//! | Magic (4B)     |  "SGB1"
//! | Version (4B)   |  格式版本号
//! | Flags (4B)     |  标志位（保留）
//! | Index Offset   |  字段索引偏移 (8B)
//! +----------------+
//! | Data Chunk 1   |  小端原始数据
//! | Data Chunk 2   |
//! | ...            |
//! +----------------+
//! | Field Index    |  JSON 序列化的 FieldIndex
//! +----------------+
//! ```

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{IoError, IoResult};
use crate::fields::{DataType, FieldDescriptor, FieldIndex};

/// SGB 文件魔数
pub const SGB_MAGIC: &[u8; 4] = b"SGB1";

/// SGB 当前版本
pub const SGB_VERSION: u32 = 1;

// ============================================================
// 标量编码
// ============================================================

/// 可按小端存入 SGB 的标量
pub trait SgbScalar: Copy {
    /// 对应的数据类型
    const DTYPE: DataType;

    /// 追加小端字节
    fn write_le(self, out: &mut Vec<u8>);

    /// 从恰好 `element_size` 字节解码
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_sgb_scalar {
    ($t:ty, $dtype:expr, $n:expr) => {
        impl SgbScalar for $t {
            const DTYPE: DataType = $dtype;

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; $n];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }
        }
    };
}

impl_sgb_scalar!(f64, DataType::F64, 8);
impl_sgb_scalar!(f32, DataType::F32, 4);
impl_sgb_scalar!(u32, DataType::U32, 4);
impl_sgb_scalar!(u8, DataType::U8, 1);

// ============================================================
// 文件头
// ============================================================

/// SGB 文件头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgbHeader {
    /// 版本号
    pub version: u32,
    /// 标志位
    pub flags: u32,
    /// 字段索引在文件中的偏移
    pub index_offset: u64,
}

impl SgbHeader {
    /// 头部大小（字节）
    pub const SIZE: usize = 4 + 4 + 4 + 8; // magic + version + flags + index_offset

    /// 创建新头部
    pub fn new() -> Self {
        Self {
            version: SGB_VERSION,
            flags: 0,
            index_offset: 0,
        }
    }

    /// 写入头部
    pub fn write<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(SGB_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.index_offset.to_le_bytes())?;
        Ok(())
    }

    /// 读取并校验头部
    pub fn read<R: Read>(reader: &mut R) -> IoResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != SGB_MAGIC {
            return Err(IoError::container(format!("魔数错误: {:?}", magic)));
        }

        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        reader.read_exact(&mut buf4)?;
        let version = u32::from_le_bytes(buf4);
        if version == 0 || version > SGB_VERSION {
            return Err(IoError::container(format!("不支持的版本 {version}")));
        }

        reader.read_exact(&mut buf4)?;
        let flags = u32::from_le_bytes(buf4);

        reader.read_exact(&mut buf8)?;
        let index_offset = u64::from_le_bytes(buf8);
        if index_offset < Self::SIZE as u64 {
            return Err(IoError::container(format!("索引偏移 {index_offset} 位于头部内")));
        }

        Ok(Self {
            version,
            flags,
            index_offset,
        })
    }
}

// ============================================================
// 写入器
// ============================================================

/// SGB 写入器
///
/// 字段依次追加，`finish` 时写入索引并回填头部。
pub struct SgbWriter<W: Write + Seek> {
    writer: W,
    index: FieldIndex,
    current_offset: u64,
}

impl<W: Write + Seek> SgbWriter<W> {
    /// 创建新的写入器
    pub fn new(mut writer: W) -> IoResult<Self> {
        // 占位头部
        SgbHeader::new().write(&mut writer)?;

        Ok(Self {
            writer,
            index: FieldIndex::new(),
            current_offset: SgbHeader::SIZE as u64,
        })
    }

    /// 写入一个字段，`shape` 各维乘积必须等于 `data.len()`
    pub fn write_field<T: SgbScalar>(&mut self, name: &str, data: &[T], shape: &[usize]) -> IoResult<()> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(IoError::ShapeMismatch {
                field: name.to_string(),
                reason: format!("形状 {shape:?} 需要 {expected} 个元素, 实际 {}", data.len()),
            });
        }

        let desc = FieldDescriptor::new(name, T::DTYPE, shape).with_offset(self.current_offset);
        let mut bytes = Vec::with_capacity(desc.size_raw as usize);
        for &v in data {
            v.write_le(&mut bytes);
        }
        self.writer.write_all(&bytes)?;

        self.current_offset += desc.size_raw;
        self.index.add(desc);
        Ok(())
    }

    /// 完成写入，返回底层写入器
    pub fn finish(mut self) -> IoResult<W> {
        let index_offset = self.current_offset;

        let index_json = serde_json::to_vec(&self.index)
            .map_err(|e| IoError::container(format!("索引序列化失败: {e}")))?;
        self.writer.write_all(&index_json)?;

        self.writer.seek(SeekFrom::Start(0))?;
        let header = SgbHeader {
            version: SGB_VERSION,
            flags: 0,
            index_offset,
        };
        header.write(&mut self.writer)?;
        self.writer.flush()?;

        Ok(self.writer)
    }
}

// ============================================================
// 读取器
// ============================================================

/// SGB 读取器
pub struct SgbReader<R: Read + Seek> {
    reader: R,
    header: SgbHeader,
    index: FieldIndex,
}

impl<R: Read + Seek> SgbReader<R> {
    /// 打开 SGB 数据流
    pub fn open(mut reader: R) -> IoResult<Self> {
        let header = SgbHeader::read(&mut reader)?;

        reader.seek(SeekFrom::Start(header.index_offset))?;
        let mut index_data = Vec::new();
        reader.read_to_end(&mut index_data)?;
        let index: FieldIndex = serde_json::from_slice(&index_data)
            .map_err(|e| IoError::container(format!("索引解析失败: {e}")))?;

        for desc in &index.fields {
            let end = desc.offset.checked_add(desc.size_raw);
            if !desc.is_consistent()
                || desc.offset < SgbHeader::SIZE as u64
                || end.map_or(true, |end| end > header.index_offset)
            {
                return Err(IoError::container(format!("字段 {} 描述符无效", desc.name)));
            }
        }

        Ok(Self { reader, header, index })
    }

    /// 文件头
    pub fn header(&self) -> &SgbHeader {
        &self.header
    }

    /// 字段索引
    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    /// 是否包含字段
    pub fn has_field(&self, name: &str) -> bool {
        self.index.find(name).is_some()
    }

    /// 读取字段，返回数据和形状
    pub fn read_field<T: SgbScalar>(&mut self, name: &str) -> IoResult<(Vec<T>, Vec<usize>)> {
        let desc = self
            .index
            .find(name)
            .ok_or_else(|| IoError::FieldNotFound { name: name.to_string() })?;

        if desc.dtype != T::DTYPE {
            return Err(IoError::DataTypeMismatch {
                field: name.to_string(),
                expected: T::DTYPE,
                actual: desc.dtype,
            });
        }

        let shape = desc.shape.iter().map(|&d| d as usize).collect();
        let mut bytes = vec![0u8; desc.size_raw as usize];
        self.reader.seek(SeekFrom::Start(desc.offset))?;
        self.reader.read_exact(&mut bytes)?;

        let data = bytes
            .chunks_exact(T::DTYPE.element_size())
            .map(T::read_le)
            .collect();
        Ok((data, shape))
    }

    /// 读取字段并检查形状
    ///
    /// `expected` 中的 `None` 表示该维不限。
    pub fn read_field_shaped<T: SgbScalar>(
        &mut self,
        name: &str,
        expected: &[Option<usize>],
    ) -> IoResult<(Vec<T>, Vec<usize>)> {
        let (data, shape) = self.read_field::<T>(name)?;
        let matches = shape.len() == expected.len()
            && shape.iter().zip(expected).all(|(&d, e)| e.map_or(true, |e| e == d));
        if !matches {
            return Err(IoError::ShapeMismatch {
                field: name.to_string(),
                reason: format!("期望 {expected:?}, 实际 {shape:?}"),
            });
        }
        Ok((data, shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = SgbHeader {
            version: 1,
            flags: 0,
            index_offset: 1234,
        };

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), SgbHeader::SIZE);

        let header2 = SgbHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header2, header);
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut buf = Vec::new();
        SgbHeader::new().write(&mut buf).unwrap();

        let mut bad_magic = buf.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            SgbHeader::read(&mut Cursor::new(bad_magic)),
            Err(IoError::InvalidContainer { .. })
        ));

        let mut bad_version = buf;
        bad_version[4] = 9;
        assert!(matches!(
            SgbHeader::read(&mut Cursor::new(bad_version)),
            Err(IoError::InvalidContainer { .. })
        ));
    }

    #[test]
    fn test_write_read_fields() {
        let positions = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let indices = vec![10u32, 20, 30];
        let values = vec![1.5f32, -2.5];
        let flags = vec![0u8, 1];

        let mut writer = SgbWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.write_field("positions", &positions, &[2, 3]).unwrap();
        writer.write_field("indices", &indices, &[1, 3]).unwrap();
        writer.write_field("values", &values, &[2, 1]).unwrap();
        writer.write_field("flags", &flags, &[2]).unwrap();
        let buf = writer.finish().unwrap().into_inner();

        let mut reader = SgbReader::open(Cursor::new(buf)).unwrap();
        assert_eq!(reader.index().len(), 4);
        assert!(reader.has_field("flags"));

        let (p, shape) = reader.read_field::<f64>("positions").unwrap();
        assert_eq!(p, positions);
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(reader.read_field::<u32>("indices").unwrap().0, indices);
        assert_eq!(reader.read_field::<f32>("values").unwrap().0, values);
        assert_eq!(reader.read_field::<u8>("flags").unwrap().0, flags);
    }

    #[test]
    fn test_type_and_shape_checks() {
        let mut writer = SgbWriter::new(Cursor::new(Vec::new())).unwrap();
        assert!(matches!(
            writer.write_field("bad", &[1.0f64, 2.0], &[3]),
            Err(IoError::ShapeMismatch { .. })
        ));
        writer.write_field("values", &[1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let buf = writer.finish().unwrap().into_inner();

        let mut reader = SgbReader::open(Cursor::new(buf)).unwrap();
        assert!(matches!(
            reader.read_field::<f64>("values"),
            Err(IoError::DataTypeMismatch { expected: DataType::F64, actual: DataType::F32, .. })
        ));
        assert!(matches!(
            reader.read_field::<f32>("missing"),
            Err(IoError::FieldNotFound { .. })
        ));
        assert!(reader.read_field_shaped::<f32>("values", &[None, Some(2)]).is_ok());
        assert!(matches!(
            reader.read_field_shaped::<f32>("values", &[None, Some(3)]),
            Err(IoError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let mut writer = SgbWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.write_field("values", &[1.0f32; 8], &[8]).unwrap();
        let mut buf = writer.finish().unwrap().into_inner();
        buf.truncate(buf.len() - 3);
        assert!(SgbReader::open(Cursor::new(buf)).is_err());
    }
}
